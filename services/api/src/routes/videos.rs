//! Video routes

use axum::{
    Extension, Router,
    extract::{Multipart, Path, Query, State},
    middleware,
    routing::{get, patch, post},
};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};
use tracing::info;

use crate::{
    auth::{AuthUser, ensure_owner, optional_auth, require_auth},
    error::{ApiError, ApiResult},
    models::{
        UserSummary,
        video::{
            MediaRef, NewVideo, PublishStatus, Video, VideoChanges, VideoFilter, VideoListQuery,
            VideoSort,
        },
    },
    pagination::{Page, Paginated},
    response::ApiResponse,
    routes::upload_limit,
    state::AppState,
    upload::{HostedAssets, UploadForm, discard_hosted},
    validation::{MAX_NAME_LENGTH, collect, parse_id, require_non_blank, validate_max_length},
};

pub fn router(state: &AppState) -> Router<AppState> {
    let require = middleware::from_fn_with_state(state.clone(), require_auth);
    let optional = middleware::from_fn_with_state(state.clone(), optional_auth);

    Router::new()
        .route(
            "/",
            get(list_videos).merge(
                post(publish_video)
                    .layer(upload_limit(&state.config))
                    .route_layer(require.clone()),
            ),
        )
        .route(
            "/:videoId",
            get(get_video).route_layer(optional).merge(
                patch(update_video)
                    .delete(delete_video)
                    .layer(upload_limit(&state.config))
                    .route_layer(require.clone()),
            ),
        )
        .route(
            "/toggle/publish/:videoId",
            patch(toggle_publish).route_layer(require),
        )
}

/// Turn listing query parameters into a filter and page window
pub(crate) fn resolve_listing(query: &VideoListQuery) -> ApiResult<(VideoFilter, Page)> {
    let sort = VideoSort::parse(query.sort_by.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Invalid sortBy field".to_string()))?;

    let ascending = match query.sort_type.as_deref().map(str::trim) {
        None | Some("") => false,
        Some(t) if t.eq_ignore_ascii_case("desc") => false,
        Some(t) if t.eq_ignore_ascii_case("asc") => true,
        Some(_) => {
            return Err(ApiError::BadRequest(
                "sortType must be asc or desc".to_string(),
            ));
        }
    };

    let owner_id = query
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| parse_id(id, "Invalid user ID"))
        .transpose()?;

    let search = query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string);

    Ok((
        VideoFilter {
            search,
            owner_id,
            sort,
            ascending,
        },
        Page::new(query.page, query.limit),
    ))
}

pub async fn list_videos(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<VideoListQuery>, ApiError>,
) -> ApiResult<ApiResponse<Paginated<Video<UserSummary>>>> {
    let (filter, page) = resolve_listing(&query)?;
    let (items, total) = state.video_repository.list_published(&filter, page).await?;

    Ok(ApiResponse::ok(
        page.wrap(items, total),
        "Videos fetched successfully",
    ))
}

/// Upload a new video with an optional thumbnail
pub async fn publish_video(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<ApiResponse<Video>> {
    let mut form = UploadForm::read(multipart, &state.config.upload_temp_dir).await?;
    let title = form.text_or_empty("title").to_string();
    let description = form.text_or_empty("description").to_string();
    require_non_blank(&[&title, &description], "Title and description are required")?;
    collect([validate_max_length("Title", &title, MAX_NAME_LENGTH)])?;

    let video_file = form
        .take_file("video")
        .ok_or_else(|| ApiError::BadRequest("Video file is required".to_string()))?;
    let thumbnail_file = form.take_file("thumbnail");

    let mut hosted = HostedAssets::new(&state.media);
    let hosted_video = hosted
        .host(video_file)
        .await
        .ok_or_else(|| ApiError::Internal("Failed to upload video".to_string()))?;

    let thumbnail = match thumbnail_file {
        Some(file) => match hosted.host(file).await {
            Some(image) => Some(MediaRef {
                url: image.url,
                public_id: image.public_id,
            }),
            None => {
                hosted.discard().await;
                return Err(ApiError::Internal("Failed to upload thumbnail".to_string()));
            }
        },
        None => None,
    };

    let new_video = NewVideo {
        title,
        description,
        duration: hosted_video.duration.unwrap_or(0.0),
        video_file: MediaRef {
            url: hosted_video.url,
            public_id: hosted_video.public_id,
        },
        thumbnail,
        owner_id: auth.id(),
    };

    let video = match state.video_repository.create(&new_video).await {
        Ok(video) => video,
        Err(e) => {
            hosted.discard().await;
            return Err(e.into());
        }
    };
    info!("User {} published video {}", auth.id(), video.id);

    Ok(ApiResponse::created(video, "Video published successfully"))
}

/// Fetch one video; counts a view and records history for signed-in viewers
pub async fn get_video(
    State(state): State<AppState>,
    viewer: Option<Extension<AuthUser>>,
    Path(video_id): Path<String>,
) -> ApiResult<ApiResponse<Video<UserSummary>>> {
    let video_id = parse_id(&video_id, "Invalid video ID")?;
    let viewer_id = viewer.map(|Extension(auth)| auth.id());

    let mut video = state
        .video_repository
        .find_with_owner(video_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;

    if !video.is_published && viewer_id != Some(video.owner.id) {
        return Err(ApiError::Forbidden("Video is not published".to_string()));
    }

    video.views = state.video_repository.increment_views(video_id).await?;
    if let Some(viewer_id) = viewer_id {
        state
            .video_repository
            .record_watch(viewer_id, video_id)
            .await?;
    }

    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

/// Edit title, description or thumbnail
pub async fn update_video(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<String>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<ApiResponse<Video>> {
    let video_id = parse_id(&video_id, "Invalid video ID")?;
    let mut form = UploadForm::read(multipart, &state.config.upload_temp_dir).await?;

    let title = form.text("title").map(str::to_string);
    let description = form.text("description").map(str::to_string);
    let thumbnail_file = form.take_file("thumbnail");

    if title.is_none() && description.is_none() && thumbnail_file.is_none() {
        return Err(ApiError::BadRequest(
            "Provide a title, description or thumbnail to update".to_string(),
        ));
    }
    if let Some(title) = &title {
        collect([validate_max_length("Title", title, MAX_NAME_LENGTH)])?;
    }

    let video = state
        .video_repository
        .find_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;
    ensure_owner(auth.id(), &video, "You are not allowed to edit this video")?;

    let mut hosted = HostedAssets::new(&state.media);
    let thumbnail = match thumbnail_file {
        Some(file) => {
            let image = hosted
                .host(file)
                .await
                .ok_or_else(|| ApiError::Internal("Failed to upload thumbnail".to_string()))?;
            Some(MediaRef {
                url: image.url,
                public_id: image.public_id,
            })
        }
        None => None,
    };

    let changes = VideoChanges {
        title,
        description,
        thumbnail,
    };

    let updated = match state.video_repository.update(video_id, &changes).await {
        Ok(updated) => updated,
        Err(e) => {
            hosted.discard().await;
            return Err(e.into());
        }
    };

    if let (Some(_), Some(old)) = (&changes.thumbnail, &video.thumbnail) {
        discard_hosted(&state.media, &old.public_id).await;
    }

    Ok(ApiResponse::ok(updated, "Video updated successfully"))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<String>,
) -> ApiResult<ApiResponse<Value>> {
    let video_id = parse_id(&video_id, "Invalid video ID")?;

    let video = state
        .video_repository
        .find_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;
    ensure_owner(auth.id(), &video, "You are not allowed to delete this video")?;

    state.video_repository.delete(video_id).await?;

    discard_hosted(&state.media, &video.video_file.public_id).await;
    if let Some(thumbnail) = &video.thumbnail {
        discard_hosted(&state.media, &thumbnail.public_id).await;
    }

    info!("User {} deleted video {}", auth.id(), video_id);
    Ok(ApiResponse::ok(json!({}), "Video deleted successfully"))
}

pub async fn toggle_publish(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(video_id): Path<String>,
) -> ApiResult<ApiResponse<PublishStatus>> {
    let video_id = parse_id(&video_id, "Invalid video ID")?;

    let video = state
        .video_repository
        .find_by_id(video_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Video not found".to_string()))?;
    ensure_owner(auth.id(), &video, "You are not allowed to change this video")?;

    let is_published = state.video_repository.toggle_published(video_id).await?;
    info!("Video {} publish status is now {}", video_id, is_published);

    Ok(ApiResponse::ok(
        PublishStatus { is_published },
        "Publish status toggled successfully",
    ))
}
