//! Comment repository for database operations

use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::{
    models::{UserSummary, social::Comment},
    pagination::Page,
};

#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, video_id: Uuid, owner_id: Uuid, content: &str) -> Result<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (content, video_id, owner_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(content)
        .bind(video_id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Newest comments on a video first
    pub async fn list_for_video(
        &self,
        video_id: Uuid,
        page: Page,
    ) -> Result<(Vec<Comment<UserSummary>>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = $1")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Comment<UserSummary>>(
            r#"
            SELECT c.*, u.username AS owner_username, u.avatar_url AS owner_avatar
            FROM comments c
            JOIN users u ON u.id = c.owner_id
            WHERE c.video_id = $1
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(video_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }

    pub async fn update(&self, id: Uuid, content: &str) -> Result<Comment> {
        sqlx::query_as::<_, Comment>(
            "UPDATE comments SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
