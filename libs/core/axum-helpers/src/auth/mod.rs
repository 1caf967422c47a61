//! Stateless JWT authentication.
//!
//! Tokens are signed with HS256 and carry the user id, username, and admin
//! flag. Route protection is applied with [`require_auth`] / [`require_admin`]
//! middleware, which verify the token and insert a [`CurrentUser`] principal
//! into request extensions for handlers to extract.

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use jwt::{Claims, CurrentUser, JwtAuth, TOKEN_TTL};
pub use middleware::{require_admin, require_auth};
