//! Repositories for database operations
//!
//! Every repository wraps a cloned [`PgPool`](sqlx::PgPool) and returns
//! `sqlx::Result`, leaving the HTTP mapping to [`crate::error::ApiError`].

pub mod comment;
pub mod dashboard;
pub mod like;
pub mod playlist;
pub mod subscription;
pub mod tweet;
pub mod user;
pub mod video;

pub use comment::CommentRepository;
pub use dashboard::DashboardRepository;
pub use like::LikeRepository;
pub use playlist::PlaylistRepository;
pub use subscription::SubscriptionRepository;
pub use tweet::TweetRepository;
pub use user::UserRepository;
pub use video::VideoRepository;

/// Video columns joined with the owner summary; expects `videos v JOIN users u`
pub(crate) const VIDEO_WITH_OWNER: &str = r#"
    v.id, v.title, v.description, v.video_url, v.video_public_id,
    v.thumbnail_url, v.thumbnail_public_id, v.duration, v.views,
    v.is_published, v.owner_id, v.created_at, v.updated_at,
    u.username AS owner_username, u.avatar_url AS owner_avatar
"#;

/// Outcome of a presence toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// The join row now exists
    On,
    /// The join row was removed
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

/// Escape LIKE wildcards and wrap for a substring match
pub(crate) fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("cats"), "%cats%");
        assert_eq!(contains_pattern("100%_real"), "%100\\%\\_real%");
    }

    #[test]
    fn toggle_state() {
        assert!(Toggle::On.is_on());
        assert!(!Toggle::Off.is_on());
    }
}
