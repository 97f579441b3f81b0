//! Comment routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, patch, post},
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};

use crate::{
    auth::{AuthUser, ensure_owner, require_auth},
    error::{ApiError, ApiResult},
    models::{
        UserSummary,
        social::{Comment, ContentRequest},
    },
    pagination::{Page, PageQuery, Paginated},
    response::ApiResponse,
    state::AppState,
    validation::parse_id,
};

pub fn router(state: &AppState) -> Router<AppState> {
    let require = middleware::from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route(
            "/:videoId",
            get(list_comments).merge(post(add_comment).route_layer(require.clone())),
        )
        .route(
            "/c/:commentId",
            patch(update_comment)
                .delete(delete_comment)
                .route_layer(require),
        )
}

fn required_content(body: &ContentRequest) -> ApiResult<&str> {
    match body.trimmed() {
        "" => Err(ApiError::BadRequest("Comment content is required".to_string())),
        content => Ok(content),
    }
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, ApiError>,
) -> ApiResult<ApiResponse<Paginated<Comment<UserSummary>>>> {
    let video_id = parse_id(&video_id, "Invalid video ID")?;
    if !state.video_repository.exists(video_id).await? {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    let page = Page::from(query);
    let (items, total) = state
        .comment_repository
        .list_for_video(video_id, page)
        .await?;

    Ok(ApiResponse::ok(
        page.wrap(items, total),
        "Comments fetched successfully",
    ))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<ContentRequest>, ApiError>,
) -> ApiResult<ApiResponse<Comment>> {
    let video_id = parse_id(&video_id, "Invalid video ID")?;
    let content = required_content(&body)?;

    if !state.video_repository.exists(video_id).await? {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    let comment = state
        .comment_repository
        .create(video_id, auth.id(), content)
        .await?;

    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(comment_id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<ContentRequest>, ApiError>,
) -> ApiResult<ApiResponse<Comment>> {
    let comment_id = parse_id(&comment_id, "Invalid comment ID")?;
    let content = required_content(&body)?;

    let comment = state
        .comment_repository
        .find_by_id(comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;
    ensure_owner(auth.id(), &comment, "You are not allowed to edit this comment")?;

    let updated = state.comment_repository.update(comment_id, content).await?;
    Ok(ApiResponse::ok(updated, "Comment updated successfully"))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(comment_id): Path<String>,
) -> ApiResult<ApiResponse<Value>> {
    let comment_id = parse_id(&comment_id, "Invalid comment ID")?;

    let comment = state
        .comment_repository
        .find_by_id(comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;
    ensure_owner(auth.id(), &comment, "You are not allowed to delete this comment")?;

    state.comment_repository.delete(comment_id).await?;
    Ok(ApiResponse::ok(json!({}), "Comment deleted successfully"))
}
