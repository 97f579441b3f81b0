use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod error;
mod models;
mod pagination;
mod repositories;
mod response;
mod routes;
mod state;
#[cfg(test)]
mod testing;
mod upload;
mod validation;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, init_pool, run_migrations},
};
use media::{MediaConfig, MediaUploader};
use tokio::net::TcpListener;

use crate::{
    auth::{TokenConfig, TokenService},
    config::ServerConfig,
    state::AppState,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("api=info,tower_http=info")),
        )
        .init();

    info!("Starting API service");

    let server_config = ServerConfig::from_env()?;
    let token_config = TokenConfig::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool, &MIGRATOR).await?;

    let redis_pool = RedisPool::new(&RedisConfig::from_env()?)?;
    if !redis_pool.health_check().await.unwrap_or(false) {
        tracing::warn!("Redis is not reachable yet; sessions will fail until it is");
    }

    let media = MediaUploader::from_env(MediaConfig::from_env()?).await;

    tokio::fs::create_dir_all(&server_config.upload_temp_dir).await?;

    let bind_address = server_config.bind_address();
    let app_state = AppState::new(
        server_config,
        pool,
        redis_pool,
        TokenService::new(token_config),
        media,
    );

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("API service listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
