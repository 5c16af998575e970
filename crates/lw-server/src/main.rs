use anyhow::Result;
use axum::{Router, routing::get};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod db;
mod engine;
mod error;
mod state;
mod ws;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting lanewatch server");

    let pool = db::connect(&config).await?;
    tracing::info!(url = %config.database_url, "Connected to SQLite");

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let state = AppState::new(pool, config.clone());

    // SPA static file fallback (serves the dashboard, returns index.html for client-side routes)
    let spa_fallback = ServeDir::new(&config.static_dir)
        .not_found_service(ServeFile::new(format!("{}/index.html", &config.static_dir)));

    let app = Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api::router())
        .route("/ws/live", get(ws::frontend_handler::handle))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .fallback_service(spa_fallback);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("Listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
