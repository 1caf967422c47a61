//! Database connectivity for the storefront services.
//!
//! A thin layer over sea-orm: connection pool construction from
//! configuration, plus startup retry with exponential backoff.

pub mod postgres;
pub mod retry;

pub use postgres::{connect, connect_from_config, connect_from_config_with_retry};
pub use retry::RetryConfig;
