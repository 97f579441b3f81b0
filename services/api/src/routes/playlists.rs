//! Playlist routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, patch, post},
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::{AuthUser, ensure_owner, require_auth},
    error::{ApiError, ApiResult},
    models::{
        UserSummary,
        playlist::{CreatePlaylistRequest, Playlist, PlaylistRecord, UpdatePlaylistRequest},
        video::Video,
    },
    pagination::{Page, PageQuery, Paginated},
    response::ApiResponse,
    state::AppState,
    validation::{MAX_NAME_LENGTH, collect, parse_id, require_non_blank, validate_max_length},
};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route(
            "/:playlistId",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route("/add/:videoId/:playlistId", patch(add_video))
        .route("/remove/:videoId/:playlistId", patch(remove_video))
        .route("/user/:userId", get(user_playlists))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

async fn find_playlist(state: &AppState, raw_id: &str) -> ApiResult<PlaylistRecord> {
    let id = parse_id(raw_id, "Invalid playlist ID")?;
    state
        .playlist_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Playlist not found".to_string()))
}

pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<CreatePlaylistRequest>, ApiError>,
) -> ApiResult<ApiResponse<Playlist>> {
    require_non_blank(
        &[&body.name, &body.description],
        "Name and description are required",
    )?;
    collect([validate_max_length("Playlist name", body.name.trim(), MAX_NAME_LENGTH)])?;

    let playlist = state
        .playlist_repository
        .create(
            auth.id(),
            body.name.trim(),
            body.description.trim(),
            body.is_public,
        )
        .await?;

    info!("User {} created playlist {}", auth.id(), playlist.id);
    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

/// Playlist with its videos in order; private ones only for the owner
pub async fn get_playlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(playlist_id): Path<String>,
) -> ApiResult<ApiResponse<Playlist<Video<UserSummary>>>> {
    let record = find_playlist(&state, &playlist_id).await?;
    if !record.is_public {
        ensure_owner(auth.id(), &record, "This playlist is private")?;
    }

    let videos = state
        .playlist_repository
        .videos(record.id)
        .await?
        .into_iter()
        .filter(|v| v.is_published || v.owner.id == auth.id())
        .collect();

    Ok(ApiResponse::ok(
        record.with_videos(videos),
        "Playlist fetched successfully",
    ))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(playlist_id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<UpdatePlaylistRequest>, ApiError>,
) -> ApiResult<ApiResponse<Playlist>> {
    if body.is_empty() {
        return Err(ApiError::BadRequest(
            "Provide a name, description or visibility to update".to_string(),
        ));
    }
    if body.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "Playlist name cannot be blank".to_string(),
        ));
    }
    if let Some(name) = &body.name {
        collect([validate_max_length("Playlist name", name.trim(), MAX_NAME_LENGTH)])?;
    }

    let record = find_playlist(&state, &playlist_id).await?;
    ensure_owner(auth.id(), &record, "You are not allowed to edit this playlist")?;

    let playlist = state.playlist_repository.update(record.id, &body).await?;
    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(playlist_id): Path<String>,
) -> ApiResult<ApiResponse<Value>> {
    let record = find_playlist(&state, &playlist_id).await?;
    ensure_owner(auth.id(), &record, "You are not allowed to delete this playlist")?;

    state.playlist_repository.delete(record.id).await?;
    Ok(ApiResponse::ok(json!({}), "Playlist deleted successfully"))
}

pub async fn add_video(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<ApiResponse<Playlist>> {
    let video_id = parse_id(&video_id, "Invalid video ID")?;
    let record = find_playlist(&state, &playlist_id).await?;
    ensure_owner(auth.id(), &record, "You are not allowed to edit this playlist")?;

    if !state.video_repository.exists(video_id).await? {
        return Err(ApiError::NotFound("Video not found".to_string()));
    }

    if !state
        .playlist_repository
        .add_video(record.id, video_id)
        .await?
    {
        return Err(ApiError::BadRequest(
            "Video is already in the playlist".to_string(),
        ));
    }

    let playlist = state.playlist_repository.load(record).await?;
    Ok(ApiResponse::ok(playlist, "Video added to playlist"))
}

/// Removing a video that is not in the playlist is not an error
pub async fn remove_video(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> ApiResult<ApiResponse<Playlist>> {
    let video_id = parse_id(&video_id, "Invalid video ID")?;
    let record = find_playlist(&state, &playlist_id).await?;
    ensure_owner(auth.id(), &record, "You are not allowed to edit this playlist")?;

    let removed = state
        .playlist_repository
        .remove_video(record.id, video_id)
        .await?;
    let message = if removed {
        "Video removed from playlist"
    } else {
        "Video was not in the playlist"
    };

    let playlist = state.playlist_repository.load(record).await?;
    Ok(ApiResponse::ok(playlist, message))
}

pub async fn user_playlists(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<PageQuery>, ApiError>,
) -> ApiResult<ApiResponse<Paginated<Playlist<Uuid>>>> {
    let user_id = parse_id(&user_id, "Invalid user ID")?;
    if !state.user_repository.exists(user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let page = Page::from(query);
    let (items, total) = state
        .playlist_repository
        .list_by_owner(user_id, user_id == auth.id(), page)
        .await?;

    Ok(ApiResponse::ok(
        page.wrap(items, total),
        "Playlists fetched successfully",
    ))
}
