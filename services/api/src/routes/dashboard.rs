//! Channel dashboard routes

use axum::{Extension, Router, extract::State, middleware, routing::get};

use crate::{
    auth::{AuthUser, require_auth},
    error::ApiResult,
    models::{dashboard::ChannelStats, video::Video},
    response::ApiResponse,
    state::AppState,
};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(channel_stats))
        .route("/videos", get(channel_videos))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

pub async fn channel_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<ApiResponse<ChannelStats>> {
    let stats = state.dashboard_repository.stats(auth.id()).await?;
    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

pub async fn channel_videos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<ApiResponse<Vec<Video>>> {
    let videos = state.dashboard_repository.videos(auth.id()).await?;
    Ok(ApiResponse::ok(videos, "Channel videos fetched successfully"))
}
