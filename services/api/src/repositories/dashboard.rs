//! Read-only projections over a channel's own content

use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::models::{dashboard::ChannelStats, video::Video};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn stats(&self, owner_id: Uuid) -> Result<ChannelStats> {
        sqlx::query_as::<_, ChannelStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM videos WHERE owner_id = $1) AS total_videos,
                (SELECT COALESCE(SUM(views), 0)::BIGINT FROM videos WHERE owner_id = $1)
                    AS total_views,
                (SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1) AS total_subscribers,
                (
                    SELECT COUNT(*) FROM likes l
                    JOIN videos v ON v.id = l.video_id
                    WHERE v.owner_id = $1
                ) AS total_likes
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Every video of the channel, unpublished included
    pub async fn videos(&self, owner_id: Uuid) -> Result<Vec<Video>> {
        sqlx::query_as::<_, Video>(
            "SELECT * FROM videos WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }
}
