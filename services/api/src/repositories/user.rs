//! User repository for database operations

use sqlx::{PgPool, Result};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    user::{ChannelProfile, ImageRef, NewUser, PublicUser, User},
    video::WatchedVideo,
};

use super::VIDEO_WITH_OWNER;

const PUBLIC_COLUMNS: &str = r#"
    id, username, email, full_name, avatar_url AS avatar,
    cover_image_url AS cover_image, created_at, updated_at
"#;

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.username);

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                username, email, full_name, password_hash,
                avatar_url, avatar_public_id, cover_image_url, cover_image_public_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(&new_user.password_hash)
        .bind(&new_user.avatar.url)
        .bind(&new_user.avatar.public_id)
        .bind(new_user.cover_image.as_ref().map(|c| c.url.as_str()))
        .bind(new_user.cover_image.as_ref().map(|c| c.public_id.as_str()))
        .fetch_one(&self.pool)
        .await
    }

    /// Whether either identity is already taken
    pub async fn identity_taken(&self, username: &str, email: &str) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    /// Find a stored user, secrets included
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find a user whose username or email matches any lower-cased identifier
    ///
    /// When several users match, the one matching the earliest identifier wins.
    pub async fn find_by_login(&self, identifiers: &[String]) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE username = ANY($1) OR email = ANY($1)
            ORDER BY LEAST(
                array_position($1::text[], username::text),
                array_position($1::text[], email::text)
            )
            LIMIT 1
            "#,
        )
        .bind(identifiers)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a user without password hash or refresh token
    pub async fn find_public(&self, id: Uuid) -> Result<Option<PublicUser>> {
        sqlx::query_as::<_, PublicUser>(&format!(
            "SELECT {PUBLIC_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Store or clear the active refresh token
    pub async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Swap the stored refresh token only if it still equals `current`
    ///
    /// Returns false when another refresh or login rotated it first.
    pub async fn rotate_refresh_token(&self, id: Uuid, current: &str, next: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $3 WHERE id = $1 AND refresh_token = $2",
        )
        .bind(id)
        .bind(current)
        .bind(next)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_account(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<Option<PublicUser>> {
        sqlx::query_as::<_, PublicUser>(&format!(
            r#"
            UPDATE users SET full_name = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {PUBLIC_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(full_name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn update_avatar(&self, id: Uuid, avatar: &ImageRef) -> Result<Option<PublicUser>> {
        sqlx::query_as::<_, PublicUser>(&format!(
            r#"
            UPDATE users SET avatar_url = $2, avatar_public_id = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {PUBLIC_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&avatar.url)
        .bind(&avatar.public_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn update_cover_image(
        &self,
        id: Uuid,
        cover_image: &ImageRef,
    ) -> Result<Option<PublicUser>> {
        sqlx::query_as::<_, PublicUser>(&format!(
            r#"
            UPDATE users SET cover_image_url = $2, cover_image_public_id = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {PUBLIC_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&cover_image.url)
        .bind(&cover_image.public_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Channel page for `username` as seen by `viewer_id`
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: Uuid,
    ) -> Result<Option<ChannelProfile>> {
        sqlx::query_as::<_, ChannelProfile>(
            r#"
            SELECT
                u.id, u.username, u.full_name, u.email,
                u.avatar_url AS avatar, u.cover_image_url AS cover_image,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id)
                    AS subscribers_count,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id)
                    AS channels_subscribed_to_count,
                EXISTS (
                    SELECT 1 FROM subscriptions s
                    WHERE s.channel_id = u.id AND s.subscriber_id = $2
                ) AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .bind(viewer_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Watched videos, most recent first
    pub async fn watch_history(&self, user_id: Uuid) -> Result<Vec<WatchedVideo>> {
        sqlx::query_as::<_, WatchedVideo>(&format!(
            r#"
            SELECT {VIDEO_WITH_OWNER}, h.watched_at
            FROM watch_history h
            JOIN videos v ON v.id = h.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE h.user_id = $1
            ORDER BY h.watched_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
