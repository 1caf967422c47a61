use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::{info, log::LevelFilter};

use core_config::database::DatabaseConfig;

use crate::retry::{RetryConfig, retry_with_backoff};

/// Connect to a PostgreSQL database with default pool settings.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    connect_with_options(base_options(database_url, 20, 2)).await
}

/// Connect using a [`DatabaseConfig`].
///
/// # Example
/// ```ignore
/// use core_config::{FromEnv, database::DatabaseConfig};
/// use database::postgres::connect_from_config;
///
/// let config = DatabaseConfig::from_env()?;
/// let db = connect_from_config(&config).await?;
/// ```
pub async fn connect_from_config(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let options = base_options(&config.url, config.max_connections, config.min_connections);
    connect_with_options(options).await
}

/// Connect from config with automatic retry on failure.
///
/// Uses exponential backoff so startup survives a database that is still
/// coming up.
pub async fn connect_from_config_with_retry(
    config: &DatabaseConfig,
    retry_config: Option<RetryConfig>,
) -> Result<DatabaseConnection, DbErr> {
    let options = base_options(&config.url, config.max_connections, config.min_connections);
    let retry = retry_config.unwrap_or_default();

    retry_with_backoff(
        || {
            let opts = options.clone();
            connect_with_options(opts)
        },
        retry,
    )
    .await
}

async fn connect_with_options(options: ConnectOptions) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(options).await?;
    info!("Successfully connected to PostgreSQL database");
    Ok(db)
}

fn base_options(url: &str, max_connections: u32, min_connections: u32) -> ConnectOptions {
    let mut opt = ConnectOptions::new(url);
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug); // SeaORM requires log::LevelFilter
    opt
}
