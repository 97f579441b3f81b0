//! Subscription routes

use axum::{
    Extension, Router,
    extract::{Path, State},
    middleware,
    routing::get,
};
use uuid::Uuid;

use crate::{
    auth::{AuthUser, require_auth},
    error::{ApiError, ApiResult},
    models::subscription::{SubscriptionEntry, SubscriptionStatus},
    response::ApiResponse,
    state::AppState,
    validation::parse_id,
};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/c/:channelId",
            get(channel_subscribers).post(toggle_subscription),
        )
        .route("/u/:subscriberId", get(subscribed_channels))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Reject self-subscription before touching the store
pub(crate) fn ensure_not_self(subscriber_id: Uuid, channel_id: Uuid) -> ApiResult<()> {
    if subscriber_id == channel_id {
        return Err(ApiError::BadRequest(
            "You cannot subscribe to yourself".to_string(),
        ));
    }
    Ok(())
}

pub async fn toggle_subscription(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(channel_id): Path<String>,
) -> ApiResult<ApiResponse<SubscriptionStatus>> {
    let channel_id = parse_id(&channel_id, "Invalid channel ID")?;
    ensure_not_self(auth.id(), channel_id)?;

    if !state.user_repository.exists(channel_id).await? {
        return Err(ApiError::NotFound("Channel not found".to_string()));
    }

    let subscribed = state
        .subscription_repository
        .toggle(auth.id(), channel_id)
        .await?
        .is_on();
    let message = if subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };

    Ok(ApiResponse::ok(SubscriptionStatus { subscribed }, message))
}

pub async fn channel_subscribers(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<SubscriptionEntry>>> {
    let channel_id = parse_id(&channel_id, "Invalid channel ID")?;
    if !state.user_repository.exists(channel_id).await? {
        return Err(ApiError::NotFound("Channel not found".to_string()));
    }

    let subscribers = state.subscription_repository.subscribers(channel_id).await?;
    Ok(ApiResponse::ok(subscribers, "Subscribers fetched successfully"))
}

pub async fn subscribed_channels(
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<SubscriptionEntry>>> {
    let subscriber_id = parse_id(&subscriber_id, "Invalid subscriber ID")?;
    if !state.user_repository.exists(subscriber_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let channels = state.subscription_repository.channels(subscriber_id).await?;
    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully",
    ))
}
