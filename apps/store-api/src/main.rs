use axum::Router;
use axum_helpers::{JwtAuth, create_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use migration::{Migrator, MigratorTrait};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod openapi;

use config::Config;
use domain_catalog::{CatalogService, PgCatalogRepository};
use domain_users::{PgUserRepository, UserService};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    init_tracing(&config.environment);

    // Connect to PostgreSQL, retrying while the database comes up
    let db = database::connect_from_config_with_retry(&config.database, None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    Migrator::up(&db, None)
        .await
        .map_err(|e| eyre::eyre!("Migration failed: {}", e))?;

    let jwt = JwtAuth::from_config(&config.jwt);

    let catalog_service = CatalogService::new(PgCatalogRepository::new(db.clone()));
    let user_service = UserService::new(PgUserRepository::new(db.clone()));

    let api_routes = Router::new()
        .nest(
            "/api/products",
            domain_catalog::handlers::router(catalog_service, jwt.clone()),
        )
        .nest(
            "/api/users",
            domain_users::handlers::router(user_service, jwt),
        );

    let app = api_routes
        .merge(health_router("store-api", env!("CARGO_PKG_VERSION")))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::build()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Starting store API");

    create_app(app, &config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    // Graceful shutdown already drained requests; close the pool last
    if let Err(e) = db.close().await {
        tracing::error!("Error closing PostgreSQL: {}", e);
    }

    info!("Store API shutdown complete");
    Ok(())
}
