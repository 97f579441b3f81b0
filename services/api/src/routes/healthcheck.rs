//! Liveness and readiness probes

use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::{response::ApiResponse, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/healthcheck/ready", get(readiness))
}

pub async fn healthcheck() -> ApiResponse<Value> {
    ApiResponse::ok(json!({ "status": "OK" }), "Server is healthy")
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub database: bool,
    pub redis: bool,
}

/// Reachability of the database and Redis
pub async fn readiness(State(state): State<AppState>) -> ApiResponse<Readiness> {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or_else(|e| {
            warn!("Database not ready: {}", e);
            false
        });
    let redis = state.redis_pool.health_check().await.unwrap_or_else(|e| {
        warn!("Redis not ready: {}", e);
        false
    });

    let readiness = Readiness { database, redis };
    if database && redis {
        ApiResponse::ok(readiness, "Service is ready")
    } else {
        ApiResponse::new(
            StatusCode::SERVICE_UNAVAILABLE,
            readiness,
            "Service dependencies unavailable",
        )
    }
}
