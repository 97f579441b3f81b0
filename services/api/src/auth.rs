//! Authentication: tokens, passwords, session cookies and ownership checks

use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        playlist::PlaylistRecord,
        social::{Comment, Tweet},
        user::PublicUser,
        video::Video,
    },
};

pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod throttle;

pub use jwt::{TokenConfig, TokenService};
pub use middleware::{optional_auth, require_auth};
pub use throttle::LoginThrottle;

/// The user acting on a request, attached by the auth middleware
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: PublicUser,
    /// Token the request was authenticated with
    pub access_token: String,
    /// `exp` of that token, seconds since the epoch
    pub expires_at: u64,
}

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    /// Seconds until the presented access token expires
    pub fn remaining_lifetime(&self) -> u64 {
        self.expires_at.saturating_sub(jwt::now())
    }
}

/// Redis key marking a logged-out access token
pub(crate) fn revoked_key(token: &str) -> String {
    format!("revoked_access_token:{}", token)
}

/// Entities with a single owning user
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Video {
    fn owner_id(&self) -> Uuid {
        self.owner
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.owner
    }
}

impl Owned for Tweet {
    fn owner_id(&self) -> Uuid {
        self.owner
    }
}

impl Owned for PlaylistRecord {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

/// Fail Forbidden with `message` unless `actor` owns `entity`
pub fn ensure_owner(actor: Uuid, entity: &impl Owned, message: &str) -> ApiResult<()> {
    if entity.owner_id() == actor {
        Ok(())
    } else {
        Err(ApiError::Forbidden(message.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tweet(owner: Uuid) -> Tweet {
        Tweet {
            id: Uuid::new_v4(),
            content: "hello".into(),
            owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_passes() {
        let owner = Uuid::new_v4();
        assert!(ensure_owner(owner, &tweet(owner), "nope").is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        let err = ensure_owner(Uuid::new_v4(), &tweet(Uuid::new_v4()), "Not your tweet")
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(msg) if msg == "Not your tweet"));
    }

    #[test]
    fn revocation_keys_are_namespaced() {
        assert_eq!(revoked_key("abc"), "revoked_access_token:abc");
    }
}
