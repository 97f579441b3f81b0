//! Account, session and channel profile routes

use axum::{
    Extension, Json, Router,
    extract::{Multipart, Path, State},
    middleware,
    routing::{get, patch, post},
};
use axum_extra::extract::{WithRejection, cookie::CookieJar};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{
    auth::{
        AuthUser, cookies, optional_auth,
        password::{hash_password, verify_password},
        require_auth, revoked_key,
    },
    error::{ApiError, ApiResult},
    models::{
        user::{
            ChangePasswordRequest, ChannelProfile, ImageRef, LoginRequest, LoginResponse,
            NewUser, PublicUser, RefreshTokenRequest, TokenPair, UpdateAccountRequest,
        },
        video::WatchedVideo,
    },
    response::ApiResponse,
    routes::upload_limit,
    state::AppState,
    upload::{HostedAssets, UploadForm, discard_hosted},
    validation::{
        MAX_NAME_LENGTH, collect, require_non_blank, validate_email, validate_max_length,
        validate_password, validate_username,
    },
};

pub fn router(state: &AppState) -> Router<AppState> {
    let require = middleware::from_fn_with_state(state.clone(), require_auth);
    let optional = middleware::from_fn_with_state(state.clone(), optional_auth);

    let protected = Router::new()
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar).layer(upload_limit(&state.config)))
        .route("/cover-image", patch(update_cover_image).layer(upload_limit(&state.config)))
        .route("/c/:username", get(channel_profile))
        .route("/history", get(watch_history))
        .route_layer(require);

    Router::new()
        .route("/register", post(register).layer(upload_limit(&state.config)))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_access_token))
        .route("/logout", post(logout).route_layer(optional))
        .merge(protected)
}

/// Register with a multipart form
pub async fn register(
    State(state): State<AppState>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let mut form = UploadForm::read(multipart, &state.config.upload_temp_dir).await?;

    let full_name = form.text_or_empty("fullName").to_string();
    let username = form.text_or_empty("username").to_lowercase();
    let email = form.text_or_empty("email").to_lowercase();
    let password = form.raw("password").to_string();

    require_non_blank(
        &[&full_name, &username, &email, &password],
        "All fields are required",
    )?;
    collect([
        validate_max_length("Full name", &full_name, MAX_NAME_LENGTH),
        validate_username(&username),
        validate_email(&email),
        validate_password(&password),
    ])?;

    if state
        .user_repository
        .identity_taken(&username, &email)
        .await?
    {
        return Err(ApiError::Conflict(
            "User with email or username already exists".to_string(),
        ));
    }

    let avatar_file = form
        .take_file("avatar")
        .ok_or_else(|| ApiError::BadRequest("Avatar file is required".to_string()))?;
    let cover_file = form.take_file("coverImage");

    let mut hosted = HostedAssets::new(&state.media);
    let avatar = hosted
        .host(avatar_file)
        .await
        .ok_or_else(|| ApiError::BadRequest("Failed to upload avatar".to_string()))?;

    let cover_image = match cover_file {
        Some(file) => {
            let cover = hosted.host(file).await;
            if cover.is_none() {
                warn!("Cover image upload failed for {}; continuing without", username);
            }
            cover
        }
        None => None,
    };

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            hosted.discard().await;
            return Err(ApiError::internal("Failed to hash password", e));
        }
    };

    let new_user = NewUser {
        username,
        email,
        full_name,
        password_hash,
        avatar: ImageRef {
            url: avatar.url,
            public_id: avatar.public_id,
        },
        cover_image: cover_image.map(|c| ImageRef {
            url: c.url,
            public_id: c.public_id,
        }),
    };

    let user = match state.user_repository.create(&new_user).await {
        Ok(user) => user,
        Err(e) => {
            hosted.discard().await;
            return Err(e.into());
        }
    };

    info!("Registered user {} ({})", user.username, user.id);
    Ok(ApiResponse::created(
        PublicUser::from(&user),
        "User registered successfully",
    ))
}

/// Log in with username or email
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<(CookieJar, ApiResponse<LoginResponse>)> {
    let identifiers = payload.identifiers();
    let identifier = identifiers
        .first()
        .cloned()
        .ok_or_else(|| ApiError::BadRequest("Username or email is required".to_string()))?;
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    match state.login_throttle.is_locked(&identifier).await {
        Ok(true) => {
            return Err(ApiError::TooManyRequests(
                "Too many failed login attempts, try again later".to_string(),
            ));
        }
        Ok(false) => {}
        Err(e) => warn!("Login throttle unavailable: {}", e),
    }

    let user = match state.user_repository.find_by_login(&identifiers).await? {
        Some(user) => user,
        None => {
            record_failed_login(&state, &identifier).await;
            return Err(ApiError::NotFound("User does not exist".to_string()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        record_failed_login(&state, &identifier).await;
        return Err(ApiError::Unauthorized(
            "Invalid user credentials".to_string(),
        ));
    }

    if let Err(e) = state.login_throttle.clear(&identifier).await {
        warn!("Failed to clear login attempts: {}", e);
    }

    let public = PublicUser::from(&user);
    let tokens = state
        .tokens
        .generate_pair(&public)
        .map_err(|e| ApiError::internal("Failed to issue tokens", e))?;

    state
        .user_repository
        .set_refresh_token(user.id, Some(&tokens.refresh_token))
        .await?;

    info!("User {} logged in", user.id);
    let jar = cookies::with_session(jar, &tokens, state.config.is_production());

    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: public,
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

async fn record_failed_login(state: &AppState, identifier: &str) {
    if let Err(e) = state.login_throttle.record_failure(identifier).await {
        warn!("Failed to record login attempt: {}", e);
    }
}

/// Clear the session; anonymous callers just get their cookies cleared
pub async fn logout(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, ApiResponse<Value>)> {
    if let Some(Extension(auth)) = auth {
        state.user_repository.set_refresh_token(auth.id(), None).await?;

        let ttl = auth.remaining_lifetime().max(1);
        if let Err(e) = state
            .redis_pool
            .set(&revoked_key(&auth.access_token), "1", Some(ttl))
            .await
        {
            warn!("Failed to revoke access token for {}: {}", auth.id(), e);
        }

        info!("User {} logged out", auth.id());
    }

    Ok((
        cookies::without_session(jar),
        ApiResponse::ok(json!({}), "User logged out"),
    ))
}

/// Rotate the token pair
pub async fn refresh_access_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshTokenRequest>>,
) -> ApiResult<(CookieJar, ApiResponse<TokenPair>)> {
    let presented = jar
        .get(cookies::REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

    let claims = state
        .tokens
        .validate_refresh_token(&presented)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let user = state
        .user_repository
        .find_public(claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid refresh token".to_string()))?;

    let tokens = state
        .tokens
        .generate_pair(&user)
        .map_err(|e| ApiError::internal("Failed to issue tokens", e))?;

    let rotated = state
        .user_repository
        .rotate_refresh_token(user.id, &presented, &tokens.refresh_token)
        .await?;
    if !rotated {
        warn!("Rejected stale refresh token for {}", user.id);
        return Err(ApiError::Unauthorized(
            "Refresh token is expired or used".to_string(),
        ));
    }

    info!("Refreshed session for {}", user.id);
    let jar = cookies::with_session(jar, &tokens, state.config.is_production());
    Ok((jar, ApiResponse::ok(tokens, "Access token refreshed")))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<ChangePasswordRequest>, ApiError>,
) -> ApiResult<ApiResponse<Value>> {
    require_non_blank(
        &[&payload.old_password, &payload.new_password],
        "Old and new password are required",
    )?;
    collect([validate_password(&payload.new_password)])?;

    let user = state
        .user_repository
        .find_by_id(auth.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(&payload.old_password, &user.password_hash) {
        return Err(ApiError::BadRequest("Invalid old password".to_string()));
    }

    let password_hash = hash_password(&payload.new_password)
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;
    state
        .user_repository
        .update_password(user.id, &password_hash)
        .await?;

    info!("User {} changed password", user.id);
    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

pub async fn current_user(Extension(auth): Extension<AuthUser>) -> ApiResponse<PublicUser> {
    ApiResponse::ok(auth.user, "Current user fetched successfully")
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateAccountRequest>, ApiError>,
) -> ApiResult<ApiResponse<PublicUser>> {
    require_non_blank(
        &[&payload.full_name, &payload.email],
        "All fields are required",
    )?;

    let full_name = payload.full_name.trim();
    let email = payload.email.trim().to_lowercase();
    collect([
        validate_max_length("Full name", full_name, MAX_NAME_LENGTH),
        validate_email(&email),
    ])?;

    let user = state
        .user_repository
        .update_account(auth.id(), full_name, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(user, "Account details updated successfully"))
}

pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let mut form = UploadForm::read(multipart, &state.config.upload_temp_dir).await?;
    let file = form
        .take_file("avatar")
        .ok_or_else(|| ApiError::BadRequest("Avatar file is missing".to_string()))?;

    let current = state
        .user_repository
        .find_by_id(auth.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut hosted = HostedAssets::new(&state.media);
    let image = hosted
        .host(file)
        .await
        .ok_or_else(|| ApiError::BadRequest("Error while uploading avatar".to_string()))?;

    let updated = state
        .user_repository
        .update_avatar(
            auth.id(),
            &ImageRef {
                url: image.url,
                public_id: image.public_id,
            },
        )
        .await;
    let user = match updated {
        Ok(Some(user)) => user,
        Ok(None) => {
            hosted.discard().await;
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            hosted.discard().await;
            return Err(e.into());
        }
    };

    discard_hosted(&state.media, &current.avatar_public_id).await;
    Ok(ApiResponse::ok(user, "Avatar image updated successfully"))
}

pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<ApiResponse<PublicUser>> {
    let mut form = UploadForm::read(multipart, &state.config.upload_temp_dir).await?;
    let file = form
        .take_file("coverImage")
        .ok_or_else(|| ApiError::BadRequest("Cover image file is missing".to_string()))?;

    let current = state
        .user_repository
        .find_by_id(auth.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut hosted = HostedAssets::new(&state.media);
    let image = hosted
        .host(file)
        .await
        .ok_or_else(|| ApiError::BadRequest("Error while uploading cover image".to_string()))?;

    let updated = state
        .user_repository
        .update_cover_image(
            auth.id(),
            &ImageRef {
                url: image.url,
                public_id: image.public_id,
            },
        )
        .await;
    let user = match updated {
        Ok(Some(user)) => user,
        Ok(None) => {
            hosted.discard().await;
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            hosted.discard().await;
            return Err(e.into());
        }
    };

    if let Some(old) = current.cover_image_public_id {
        discard_hosted(&state.media, &old).await;
    }
    Ok(ApiResponse::ok(user, "Cover image updated successfully"))
}

pub async fn channel_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(username): Path<String>,
) -> ApiResult<ApiResponse<ChannelProfile>> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is missing".to_string()));
    }

    let profile = state
        .user_repository
        .channel_profile(&username, auth.id())
        .await?
        .ok_or_else(|| ApiError::NotFound("Channel does not exist".to_string()))?;

    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

pub async fn watch_history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<ApiResponse<Vec<WatchedVideo>>> {
    let history = state.user_repository.watch_history(auth.id()).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::actor;
    use std::marker::PhantomData;

    #[tokio::test]
    async fn overlong_full_name_is_rejected_on_update() {
        let body = UpdateAccountRequest {
            full_name: "x".repeat(300),
            email: "jane@example.com".to_string(),
        };

        let err = update_account(
            State(AppState::offline()),
            Extension(actor()),
            WithRejection(Json(body), PhantomData),
        )
        .await
        .unwrap_err();

        match err {
            ApiError::Validation { errors, .. } => {
                assert_eq!(errors, ["Full name must be at most 255 characters long"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
