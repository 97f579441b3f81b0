//! Subscription repository for database operations

use sqlx::{PgPool, Result};
use tracing::info;
use uuid::Uuid;

use crate::models::subscription::SubscriptionEntry;

use super::Toggle;

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Unsubscribe if subscribed, otherwise subscribe
    pub async fn toggle(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<Toggle> {
        let removed = sqlx::query(
            "DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;

        if removed.rows_affected() > 0 {
            info!("User {} unsubscribed from {}", subscriber_id, channel_id);
            return Ok(Toggle::Off);
        }

        sqlx::query(
            r#"
            INSERT INTO subscriptions (subscriber_id, channel_id)
            VALUES ($1, $2)
            ON CONFLICT (subscriber_id, channel_id) DO NOTHING
            "#,
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;

        info!("User {} subscribed to {}", subscriber_id, channel_id);
        Ok(Toggle::On)
    }

    /// Users subscribed to a channel, newest first
    pub async fn subscribers(&self, channel_id: Uuid) -> Result<Vec<SubscriptionEntry>> {
        sqlx::query_as::<_, SubscriptionEntry>(
            r#"
            SELECT u.id, u.username, u.avatar_url AS avatar, s.created_at AS subscribed_at
            FROM subscriptions s
            JOIN users u ON u.id = s.subscriber_id
            WHERE s.channel_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Channels a user follows, newest first
    pub async fn channels(&self, subscriber_id: Uuid) -> Result<Vec<SubscriptionEntry>> {
        sqlx::query_as::<_, SubscriptionEntry>(
            r#"
            SELECT u.id, u.username, u.avatar_url AS avatar, s.created_at AS subscribed_at
            FROM subscriptions s
            JOIN users u ON u.id = s.channel_id
            WHERE s.subscriber_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{live_pool, seed_user};

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn toggle_subscribes_then_unsubscribes() {
        let pool = live_pool().await;
        let repository = SubscriptionRepository::new(pool.clone());
        let fan = seed_user(&pool).await;
        let channel = seed_user(&pool).await;

        assert_eq!(repository.toggle(fan.id, channel.id).await.unwrap(), Toggle::On);

        let subscribers = repository.subscribers(channel.id).await.unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].user.id, fan.id);

        let channels = repository.channels(fan.id).await.unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].user.id, channel.id);

        assert_eq!(repository.toggle(fan.id, channel.id).await.unwrap(), Toggle::Off);
        assert!(repository.subscribers(channel.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL"]
    async fn self_subscription_is_refused_by_the_store() {
        let pool = live_pool().await;
        let repository = SubscriptionRepository::new(pool.clone());
        let user = seed_user(&pool).await;

        let err = repository.toggle(user.id, user.id).await.unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_check_violation()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
