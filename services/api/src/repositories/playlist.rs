//! Playlist repository for database operations

use sqlx::{FromRow, PgPool, Result, Row};
use uuid::Uuid;

use crate::{
    models::{
        UserSummary,
        playlist::{Playlist, PlaylistRecord, UpdatePlaylistRequest},
        video::Video,
    },
    pagination::Page,
};

use super::VIDEO_WITH_OWNER;

#[derive(Clone)]
pub struct PlaylistRepository {
    pool: PgPool,
}

impl PlaylistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        description: &str,
        is_public: bool,
    ) -> Result<Playlist> {
        let record = sqlx::query_as::<_, PlaylistRecord>(
            r#"
            INSERT INTO playlists (name, description, is_public, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(is_public)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.with_videos(Vec::new()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PlaylistRecord>> {
        sqlx::query_as::<_, PlaylistRecord>("SELECT * FROM playlists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Member video ids in playlist order
    pub async fn video_ids(&self, playlist_id: Uuid) -> Result<Vec<Uuid>> {
        sqlx::query_scalar(
            "SELECT video_id FROM playlist_videos WHERE playlist_id = $1 ORDER BY position",
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Member videos with owners in playlist order
    pub async fn videos(&self, playlist_id: Uuid) -> Result<Vec<Video<UserSummary>>> {
        sqlx::query_as::<_, Video<UserSummary>>(&format!(
            r#"
            SELECT {VIDEO_WITH_OWNER}
            FROM playlist_videos pv
            JOIN videos v ON v.id = pv.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE pv.playlist_id = $1
            ORDER BY pv.position
            "#
        ))
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Playlist with member ids
    pub async fn load(&self, record: PlaylistRecord) -> Result<Playlist> {
        let ids = self.video_ids(record.id).await?;
        Ok(record.with_videos(ids))
    }

    pub async fn update(&self, id: Uuid, changes: &UpdatePlaylistRequest) -> Result<Playlist> {
        let record = sqlx::query_as::<_, PlaylistRecord>(
            r#"
            UPDATE playlists SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_public = COALESCE($4, is_public),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.description.as_deref().map(str::trim))
        .bind(changes.is_public)
        .fetch_one(&self.pool)
        .await?;

        self.load(record).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Append a video; false if it was already a member
    pub async fn add_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO playlist_videos (playlist_id, video_id, position)
            SELECT $1, $2, COALESCE(MAX(position), 0) + 1
            FROM playlist_videos
            WHERE playlist_id = $1
            ON CONFLICT (playlist_id, video_id) DO NOTHING
            "#,
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            sqlx::query("UPDATE playlists SET updated_at = NOW() WHERE id = $1")
                .bind(playlist_id)
                .execute(&self.pool)
                .await?;
        }

        Ok(result.rows_affected() > 0)
    }

    /// Remove a video; false if it was not a member
    pub async fn remove_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// A user's playlists, newest first; private ones only when `include_private`
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
        include_private: bool,
        page: Page,
    ) -> Result<(Vec<Playlist>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM playlists WHERE owner_id = $1 AND (is_public OR $2)",
        )
        .bind(owner_id)
        .bind(include_private)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"
            SELECT p.*,
                COALESCE(
                    ARRAY_AGG(pv.video_id ORDER BY pv.position)
                        FILTER (WHERE pv.video_id IS NOT NULL),
                    '{}'
                ) AS video_ids
            FROM playlists p
            LEFT JOIN playlist_videos pv ON pv.playlist_id = p.id
            WHERE p.owner_id = $1 AND (p.is_public OR $2)
            GROUP BY p.id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(owner_id)
        .bind(include_private)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(|row| {
                let ids: Vec<Uuid> = row.try_get("video_ids")?;
                Ok(PlaylistRecord::from_row(row)?.with_videos(ids))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((items, total))
    }
}
