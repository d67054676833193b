use sea_orm::Database;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront::api::create_api_router;
use storefront::config::{AppConfig, DEFAULT_LOG_FILTER};
use storefront::entities::{seed_catalog, setup_schema, CatalogSeed};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let db = Database::connect(&config.database_url).await?;
    setup_schema(&db).await?;

    if config.seed_catalog {
        let seed = match &config.catalog_seed_path {
            Some(path) => CatalogSeed::from_path(path)?,
            None => CatalogSeed::builtin()?,
        };
        seed_catalog(&db, &seed).await?;
    }

    let shared_db = Arc::new(db);
    let app = create_api_router(shared_db);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Running storefront");
    axum::serve(listener, app).await?;
    Ok(())
}
