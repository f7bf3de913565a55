//! Data access layer

pub mod user;

pub use user::{is_unique_violation, UserContact, UserCredentials, UserRecord, UserRepository};
