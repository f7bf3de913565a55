//! Gatehouse Shared Library
//!
//! This crate contains the request/response types and validation helpers
//! shared between the backend and its API clients.

pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use models::UserRole;
pub use types::*;
