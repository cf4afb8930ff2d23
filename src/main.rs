use axum::{extract::DefaultBodyLimit, Extension, Router};
use server::handlers::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

mod config;
mod core;
mod error;
mod protocol;
mod server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = config::Config::from_env()?;

    info!("Starting bytelens backend server");
    info!("Configuration: {:?}", config);

    let state = Arc::new(AppState {
        store: Arc::new(core::FileStore::new(
            config.upload_dir.clone(),
            config.max_file_size,
        )),
        cache: Arc::new(core::SampleCache::new(config.cache_size)),
        config: config.clone(),
    });

    let app = Router::new()
        .nest("/api", server::api_routes())
        .nest("/ws", server::ws_routes())
        .layer(Extension(state))
        .layer(CorsLayer::permissive())
        // Request bodies are capped at the configured max file size.
        .layer(DefaultBodyLimit::max(config.max_file_size));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
