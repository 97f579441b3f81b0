//! Like toggles and liked videos

use axum::{
    Extension, Router,
    extract::{Path, State},
    middleware,
    routing::{get, post},
};

use crate::{
    auth::{AuthUser, require_auth},
    error::{ApiError, ApiResult},
    models::like::{LikeStatus, LikeTarget, LikedVideo},
    response::ApiResponse,
    state::AppState,
    validation::parse_id,
};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/toggle/v/:videoId", post(toggle_video_like))
        .route("/toggle/c/:commentId", post(toggle_comment_like))
        .route("/toggle/t/:tweetId", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

async fn toggle(
    state: &AppState,
    auth: &AuthUser,
    raw_id: &str,
    target: LikeTarget,
) -> ApiResult<ApiResponse<LikeStatus>> {
    let id = parse_id(raw_id, &format!("Invalid {} ID", target.noun().to_lowercase()))?;

    if !state.like_repository.target_exists(target, id).await? {
        return Err(ApiError::NotFound(format!("{} not found", target.noun())));
    }

    let liked = state
        .like_repository
        .toggle(auth.id(), target, id)
        .await?
        .is_on();
    let message = if liked { "Like added" } else { "Like removed" };

    Ok(ApiResponse::ok(LikeStatus { liked }, message))
}

pub async fn toggle_video_like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<String>,
) -> ApiResult<ApiResponse<LikeStatus>> {
    toggle(&state, &auth, &video_id, LikeTarget::Video).await
}

pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(comment_id): Path<String>,
) -> ApiResult<ApiResponse<LikeStatus>> {
    toggle(&state, &auth, &comment_id, LikeTarget::Comment).await
}

pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(tweet_id): Path<String>,
) -> ApiResult<ApiResponse<LikeStatus>> {
    toggle(&state, &auth, &tweet_id, LikeTarget::Tweet).await
}

pub async fn liked_videos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<ApiResponse<Vec<LikedVideo>>> {
    let videos = state.like_repository.liked_videos(auth.id()).await?;
    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
