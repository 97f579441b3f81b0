//! Tweet repository for database operations

use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::{UserSummary, social::Tweet};

#[derive(Clone)]
pub struct TweetRepository {
    pool: PgPool,
}

impl TweetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, content: &str) -> Result<Tweet> {
        sqlx::query_as::<_, Tweet>(
            "INSERT INTO tweets (content, owner_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(content)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Tweet>> {
        sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// A user's tweets, newest first
    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Tweet<UserSummary>>> {
        sqlx::query_as::<_, Tweet<UserSummary>>(
            r#"
            SELECT t.*, u.username AS owner_username, u.avatar_url AS owner_avatar
            FROM tweets t
            JOIN users u ON u.id = t.owner_id
            WHERE t.owner_id = $1
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update(&self, id: Uuid, content: &str) -> Result<Tweet> {
        sqlx::query_as::<_, Tweet>(
            "UPDATE tweets SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
