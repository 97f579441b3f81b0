//! Middleware attaching the authenticated user to the request
//!
//! The access token is read from the `accessToken` cookie first and then from
//! `Authorization: Bearer`.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{Authorization, HeaderMapExt, authorization::Bearer},
};
use common::cache::RedisPool;
use tracing::{debug, warn};

use super::{AuthUser, cookies::ACCESS_COOKIE, revoked_key};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Access token from cookie, then bearer header
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(ACCESS_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            headers
                .typed_get::<Authorization<Bearer>>()
                .map(|auth| auth.token().to_string())
        })
}

/// Whether the token was revoked at logout
///
/// An unreachable store counts as not revoked, like the login throttle.
pub async fn is_revoked(redis: &RedisPool, token: &str) -> bool {
    match redis.exists(&revoked_key(token)).await {
        Ok(revoked) => revoked,
        Err(e) => {
            warn!("Revocation check unavailable, accepting token: {}", e);
            false
        }
    }
}

/// Resolve a presented access token into the acting user
async fn authenticate(state: &AppState, token: &str) -> ApiResult<AuthUser> {
    let claims = state
        .tokens
        .validate_access_token(token)
        .map_err(|e| ApiError::Unauthorized(format!("Invalid access token: {}", e)))?;

    if is_revoked(&state.redis_pool, token).await {
        return Err(ApiError::Unauthorized("Access token has been revoked".to_string()));
    }

    let user = state
        .user_repository
        .find_public(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid access token".to_string()))?;

    Ok(AuthUser {
        user,
        access_token: token.to_string(),
        expires_at: claims.exp,
    })
}

/// Reject the request unless it carries a valid access token
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = extract_access_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

    let auth = authenticate(&state, &token).await?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

/// Attach the user when a valid token is present, otherwise continue anonymously
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(token) = extract_access_token(req.headers()) {
        match authenticate(&state, &token).await {
            Ok(auth) => {
                req.extensions_mut().insert(auth);
            }
            Err(e) => debug!("Continuing anonymously: {}", e),
        }
    }

    next.run(req).await
}
