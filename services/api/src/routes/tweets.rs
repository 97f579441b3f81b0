//! Tweet routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
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
        social::{ContentRequest, Tweet},
    },
    response::ApiResponse,
    state::AppState,
    validation::parse_id,
};

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/:userId", get(user_tweets))
        .route("/:tweetId", patch(update_tweet).delete(delete_tweet))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

fn required_content(body: &ContentRequest) -> ApiResult<&str> {
    match body.trimmed() {
        "" => Err(ApiError::BadRequest("Tweet content is required".to_string())),
        content => Ok(content),
    }
}

pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<ContentRequest>, ApiError>,
) -> ApiResult<ApiResponse<Tweet>> {
    let content = required_content(&body)?;
    let tweet = state.tweet_repository.create(auth.id(), content).await?;
    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

pub async fn user_tweets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<ApiResponse<Vec<Tweet<UserSummary>>>> {
    let user_id = parse_id(&user_id, "Invalid user ID")?;
    if !state.user_repository.exists(user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let tweets = state.tweet_repository.list_by_owner(user_id).await?;
    Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

pub async fn update_tweet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(tweet_id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<ContentRequest>, ApiError>,
) -> ApiResult<ApiResponse<Tweet>> {
    let tweet_id = parse_id(&tweet_id, "Invalid tweet ID")?;
    let content = required_content(&body)?;

    let tweet = state
        .tweet_repository
        .find_by_id(tweet_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tweet not found".to_string()))?;
    ensure_owner(auth.id(), &tweet, "You are not allowed to edit this tweet")?;

    let updated = state.tweet_repository.update(tweet_id, content).await?;
    Ok(ApiResponse::ok(updated, "Tweet updated successfully"))
}

pub async fn delete_tweet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(tweet_id): Path<String>,
) -> ApiResult<ApiResponse<Value>> {
    let tweet_id = parse_id(&tweet_id, "Invalid tweet ID")?;

    let tweet = state
        .tweet_repository
        .find_by_id(tweet_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Tweet not found".to_string()))?;
    ensure_owner(auth.id(), &tweet, "You are not allowed to delete this tweet")?;

    state.tweet_repository.delete(tweet_id).await?;
    Ok(ApiResponse::ok(json!({}), "Tweet deleted successfully"))
}
