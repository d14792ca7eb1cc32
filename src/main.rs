//! Quillpad - a small server-rendered blog

use anyhow::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quillpad::{
    config::Config,
    db,
    web::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quillpad=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Quillpad...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!(env = %config.server.env, "Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!(applied, "Database migrations completed");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(pool.clone(), config).await?;
    tracing::info!(path = ?state.config.upload.path, "Upload directory ready");

    let app = web::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
