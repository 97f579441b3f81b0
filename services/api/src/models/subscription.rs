//! Channel subscriptions

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::UserSummary;

/// A user subscribed to a channel, or a channel a user follows
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: UserSummary,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatus {
    pub subscribed: bool,
}
