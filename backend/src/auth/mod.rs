//! Authentication and authorization primitives

pub mod code;
pub mod cookie;
pub mod middleware;
pub mod password;
pub mod rbac;
pub mod token;

pub use middleware::CurrentUser;
pub use password::PasswordService;
pub use token::{Claims, TokenKind, TokenService};
