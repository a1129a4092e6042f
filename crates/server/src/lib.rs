pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod router;
pub mod services;
pub mod state;

use std::net::SocketAddr;

pub use config::Config;
pub use db::create_pool;
pub use router::create_router;
pub use state::AppState;

pub async fn run_server(addr: SocketAddr, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db::create_pool_with_connections(&config.database_url, config.max_connections).await?;
    let state = AppState::new(pool, config)?;
    let scheduler = state.scheduler.clone();
    let app = create_router(state);

    tracing::info!("starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
