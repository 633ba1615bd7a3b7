mod background;
mod config;
mod db;
mod errors;
mod models;
mod routes;
mod state;
mod vision_client;
mod wardrobe;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::background::RemoveBgClient;
use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::vision_client::VisionClient;
use crate::wardrobe::repository::PgItemStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Wardrobe API v{}", env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.upload_dir.display()))?;
    info!("Serving processed images from {}", config.upload_dir.display());

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Provider keys are only checked when a provider is called
    if config.remove_bg_api_key.is_none() {
        warn!("REMOVE_BG_API_KEY is not set; uploads will fail at background removal");
    }
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; uploads will fail at classification");
    }

    let background = RemoveBgClient::new(
        config.remove_bg_url.clone(),
        config.remove_bg_api_key.clone(),
    );
    let classifier = VisionClient::new(&config.openai_base_url, config.openai_api_key.clone());
    info!("Vision client initialized (model: {})", vision_client::MODEL);

    let state = AppState {
        store: Arc::new(PgItemStore::new(db)),
        background: Arc::new(background),
        classifier: Arc::new(classifier),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
