//! Server infrastructure module.
//!
//! Application startup, health endpoints, and graceful shutdown.

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::create_app;
pub use health::{HealthResponse, health_router};
pub use shutdown::shutdown_signal;
