//! API service routes

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};

use crate::{config::ServerConfig, error::ApiError, state::AppState};

pub mod comments;
pub mod dashboard;
pub mod healthcheck;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(healthcheck::router())
        .nest("/users", users::router(&state))
        .nest("/videos", videos::router(&state))
        .nest("/comments", comments::router(&state))
        .nest("/likes", likes::router(&state))
        .nest("/playlist", playlists::router(&state))
        .nest("/subscriptions", subscriptions::router(&state))
        .nest("/tweets", tweets::router(&state))
        .nest("/dashboard", dashboard::router(&state));

    Router::new()
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(state.config.json_body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .with_state(state)
}

/// Body limit for routes accepting file uploads
pub(crate) fn upload_limit(config: &ServerConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(config.upload_body_limit)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);

    ApiError::Internal("Internal server error".to_string()).into_response()
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let Some(origin) = config.cors_origin.as_deref() else {
        return CorsLayer::new();
    };

    match HeaderValue::from_str(origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION]),
        Err(e) => {
            warn!("Ignoring invalid CORS origin {}: {}", origin, e);
            CorsLayer::new()
        }
    }
}
