use anyhow::Result;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobfinder_api::config::Config;
use jobfinder_api::routes::{build_router, cors_layer};
use jobfinder_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; missing secrets abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "jobfinder_api={level},tower_http={level}",
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Job Finder API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Storage backend: {:?}, resume service: {}",
        config.storage, config.resume_service_url
    );

    let cors = cors_layer(&config.frontend_origin)?;
    let port = config.port;

    // Build app state (connects to PostgreSQL and Redis for the postgres backend)
    let state = AppState::from_config(config).await?;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
