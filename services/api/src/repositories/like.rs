//! Like repository for database operations

use sqlx::{PgPool, Result};
use tracing::info;
use uuid::Uuid;

use crate::models::like::{LikeTarget, LikedVideo};

use super::{Toggle, VIDEO_WITH_OWNER};

#[derive(Clone)]
pub struct LikeRepository {
    pool: PgPool,
}

impl LikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn target_exists(&self, target: LikeTarget, id: Uuid) -> Result<bool> {
        sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            target.table()
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
    }

    /// Remove the like if present, otherwise add it
    ///
    /// The partial unique indexes on `likes` absorb a concurrent insert.
    pub async fn toggle(&self, user_id: Uuid, target: LikeTarget, id: Uuid) -> Result<Toggle> {
        let column = target.column();

        let removed = sqlx::query(&format!(
            "DELETE FROM likes WHERE liked_by = $1 AND {column} = $2"
        ))
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if removed.rows_affected() > 0 {
            info!("User {} unliked {} {}", user_id, target.noun(), id);
            return Ok(Toggle::Off);
        }

        sqlx::query(&format!(
            "INSERT INTO likes (liked_by, {column}) VALUES ($1, $2) ON CONFLICT DO NOTHING"
        ))
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        info!("User {} liked {} {}", user_id, target.noun(), id);
        Ok(Toggle::On)
    }

    /// Published videos the user liked, newest like first
    pub async fn liked_videos(&self, user_id: Uuid) -> Result<Vec<LikedVideo>> {
        sqlx::query_as::<_, LikedVideo>(&format!(
            r#"
            SELECT {VIDEO_WITH_OWNER}, l.created_at AS liked_at
            FROM likes l
            JOIN videos v ON v.id = l.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE l.liked_by = $1 AND v.is_published = TRUE
            ORDER BY l.created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{live_pool, seed_user, seed_video};

    async fn like_rows(pool: &PgPool, user_id: Uuid, video_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE liked_by = $1 AND video_id = $2")
            .bind(user_id)
            .bind(video_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn double_toggle_restores_the_original_state() {
        let pool = live_pool().await;
        let repository = LikeRepository::new(pool.clone());
        let owner = seed_user(&pool).await;
        let fan = seed_user(&pool).await;
        let video = seed_video(&pool, owner.id, "Cats").await;

        assert_eq!(
            repository.toggle(fan.id, LikeTarget::Video, video.id).await.unwrap(),
            Toggle::On
        );
        assert_eq!(like_rows(&pool, fan.id, video.id).await, 1);

        assert_eq!(
            repository.toggle(fan.id, LikeTarget::Video, video.id).await.unwrap(),
            Toggle::Off
        );
        assert_eq!(like_rows(&pool, fan.id, video.id).await, 0);
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn concurrent_likes_leave_at_most_one_row() {
        let pool = live_pool().await;
        let repository = LikeRepository::new(pool.clone());
        let owner = seed_user(&pool).await;
        let fan = seed_user(&pool).await;
        let video = seed_video(&pool, owner.id, "Dogs").await;

        let (a, b) = tokio::join!(
            repository.toggle(fan.id, LikeTarget::Video, video.id),
            repository.toggle(fan.id, LikeTarget::Video, video.id),
        );
        a.unwrap();
        b.unwrap();

        assert!(like_rows(&pool, fan.id, video.id).await <= 1);
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn liked_videos_lists_the_liked_video() {
        let pool = live_pool().await;
        let repository = LikeRepository::new(pool.clone());
        let owner = seed_user(&pool).await;
        let fan = seed_user(&pool).await;
        let video = seed_video(&pool, owner.id, "Birds").await;

        repository.toggle(fan.id, LikeTarget::Video, video.id).await.unwrap();

        let liked = repository.liked_videos(fan.id).await.unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].video.id, video.id);
        assert_eq!(liked[0].video.owner.id, owner.id);
    }
}
