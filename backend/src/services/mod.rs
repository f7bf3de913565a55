//! Business logic layer

pub mod auth;

pub use auth::{AuthService, TokenPair, REFRESH_ERROR};
