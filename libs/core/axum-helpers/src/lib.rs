//! # Axum Helpers
//!
//! A collection of utilities, middleware, and helpers shared by the HTTP
//! layer of the storefront services.
//!
//! ## Modules
//!
//! - **[`auth`]**: stateless JWT authentication and role middleware
//! - **[`server`]**: server setup, health checks, graceful shutdown
//! - **[`errors`]**: structured error responses with error codes
//! - **[`extractors`]**: custom extractors (UUID path, validated JSON)

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod server;

// Re-export auth types
pub use auth::{Claims, CurrentUser, JwtAuth, JwtConfig, require_admin, require_auth};

// Re-export server types
pub use server::{HealthResponse, create_app, health_router, shutdown_signal};

// Re-export error types
pub use errors::{AppError, ErrorCode, ErrorResponse};

// Re-export extractors
pub use extractors::{UuidPath, ValidatedJson};
