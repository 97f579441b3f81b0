//! Video repository for database operations

use sqlx::{PgPool, Result};
use tracing::info;
use uuid::Uuid;

use crate::{
    models::{
        UserSummary,
        video::{NewVideo, Video, VideoChanges, VideoFilter},
    },
    pagination::Page,
};

use super::{VIDEO_WITH_OWNER, contains_pattern};

/// Video repository
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, video: &NewVideo) -> Result<Video> {
        info!("Creating video '{}' for {}", video.title, video.owner_id);

        sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (
                title, description, video_url, video_public_id,
                thumbnail_url, thumbnail_public_id, duration, owner_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.video_file.url)
        .bind(&video.video_file.public_id)
        .bind(video.thumbnail.as_ref().map(|t| t.url.as_str()))
        .bind(video.thumbnail.as_ref().map(|t| t.public_id.as_str()))
        .bind(video.duration)
        .bind(video.owner_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM videos WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>> {
        sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find a video with its owner summary
    pub async fn find_with_owner(&self, id: Uuid) -> Result<Option<Video<UserSummary>>> {
        sqlx::query_as::<_, Video<UserSummary>>(&format!(
            r#"
            SELECT {VIDEO_WITH_OWNER}
            FROM videos v
            JOIN users u ON u.id = v.owner_id
            WHERE v.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Published videos matching `filter`, plus the total match count
    pub async fn list_published(
        &self,
        filter: &VideoFilter,
        page: Page,
    ) -> Result<(Vec<Video<UserSummary>>, i64)> {
        let pattern = filter.search.as_deref().map(contains_pattern);
        let predicate = r#"
            v.is_published = TRUE
            AND ($1::uuid IS NULL OR v.owner_id = $1)
            AND ($2::text IS NULL OR v.title ILIKE $2 OR v.description ILIKE $2)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM videos v WHERE {predicate}"
        ))
        .bind(filter.owner_id)
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let direction = if filter.ascending { "ASC" } else { "DESC" };
        let items = sqlx::query_as::<_, Video<UserSummary>>(&format!(
            r#"
            SELECT {VIDEO_WITH_OWNER}
            FROM videos v
            JOIN users u ON u.id = v.owner_id
            WHERE {predicate}
            ORDER BY {column} {direction}, v.id {direction}
            LIMIT $3 OFFSET $4
            "#,
            column = filter.sort.column(),
        ))
        .bind(filter.owner_id)
        .bind(pattern.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }

    /// Bump the view counter, returning the new count
    pub async fn increment_views(&self, id: Uuid) -> Result<i64> {
        sqlx::query_scalar("UPDATE videos SET views = views + 1 WHERE id = $1 RETURNING views")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    /// Move `video_id` to the top of the viewer's history
    pub async fn record_watch(&self, user_id: Uuid, video_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO watch_history (user_id, video_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, video_id) DO UPDATE SET watched_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Apply the present fields of `changes`
    pub async fn update(&self, id: Uuid, changes: &VideoChanges) -> Result<Video> {
        sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                thumbnail_url = COALESCE($4, thumbnail_url),
                thumbnail_public_id = COALESCE($5, thumbnail_public_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.thumbnail.as_ref().map(|t| t.url.as_str()))
        .bind(changes.thumbnail.as_ref().map(|t| t.public_id.as_str()))
        .fetch_one(&self.pool)
        .await
    }

    /// Flip the publish flag, returning the new value
    pub async fn toggle_published(&self, id: Uuid) -> Result<bool> {
        sqlx::query_scalar(
            r#"
            UPDATE videos SET is_published = NOT is_published, updated_at = NOW()
            WHERE id = $1
            RETURNING is_published
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::video::VideoSort,
        testing::{live_pool, seed_user, seed_video},
    };

    fn newest_first(owner_id: Uuid) -> VideoFilter {
        VideoFilter {
            search: None,
            owner_id: Some(owner_id),
            sort: VideoSort::CreatedAt,
            ascending: false,
        }
    }

    /// Fifteen published videos, `Video 00` newest, one minute apart
    async fn seed_channel(pool: &PgPool) -> Uuid {
        let owner = seed_user(pool).await;
        for i in 0..15 {
            let video = seed_video(pool, owner.id, &format!("Video {:02}", i)).await;
            sqlx::query(
                "UPDATE videos SET created_at = NOW() - make_interval(mins => $2) WHERE id = $1",
            )
            .bind(video.id)
            .bind(i)
            .execute(pool)
            .await
            .unwrap();
        }
        owner.id
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn second_page_holds_the_next_ten_newest() {
        let pool = live_pool().await;
        let repository = VideoRepository::new(pool.clone());
        let owner_id = seed_channel(&pool).await;

        let (items, total) = repository
            .list_published(&newest_first(owner_id), Page::new(Some(2), Some(10)))
            .await
            .unwrap();

        assert_eq!(total, 15);
        let titles: Vec<_> = items.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(
            titles,
            ["Video 10", "Video 11", "Video 12", "Video 13", "Video 14"]
        );
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn unpublished_videos_are_not_listed() {
        let pool = live_pool().await;
        let repository = VideoRepository::new(pool.clone());
        let owner = seed_user(&pool).await;
        let shown = seed_video(&pool, owner.id, "Shown").await;
        let hidden = seed_video(&pool, owner.id, "Hidden").await;

        assert!(!repository.toggle_published(hidden.id).await.unwrap());

        let (items, total) = repository
            .list_published(&newest_first(owner.id), Page::new(None, None))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].id, shown.id);
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn views_count_up_from_zero() {
        let pool = live_pool().await;
        let repository = VideoRepository::new(pool.clone());
        let owner = seed_user(&pool).await;
        let video = seed_video(&pool, owner.id, "Counted").await;

        assert_eq!(repository.increment_views(video.id).await.unwrap(), 1);
        assert_eq!(repository.increment_views(video.id).await.unwrap(), 2);
    }
}
