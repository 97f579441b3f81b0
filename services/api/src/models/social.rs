//! Comments on videos and free-standing tweets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use uuid::Uuid;

use super::{UserSummary, owner_summary};

/// Comment on a video
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment<O = Uuid> {
    pub id: Uuid,
    pub content: String,
    pub video_id: Uuid,
    pub owner: O,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn read_comment<O>(row: &PgRow, owner: O) -> Result<Comment<O>, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        video_id: row.try_get("video_id")?,
        owner,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl<'r> FromRow<'r, PgRow> for Comment {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        read_comment(row, row.try_get("owner_id")?)
    }
}

impl<'r> FromRow<'r, PgRow> for Comment<UserSummary> {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        read_comment(row, owner_summary(row)?)
    }
}

/// Short text post
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet<O = Uuid> {
    pub id: Uuid,
    pub content: String,
    pub owner: O,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn read_tweet<O>(row: &PgRow, owner: O) -> Result<Tweet<O>, sqlx::Error> {
    Ok(Tweet {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        owner,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl<'r> FromRow<'r, PgRow> for Tweet {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        read_tweet(row, row.try_get("owner_id")?)
    }
}

impl<'r> FromRow<'r, PgRow> for Tweet<UserSummary> {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        read_tweet(row, owner_summary(row)?)
    }
}

/// Body for creating or editing a comment or tweet
#[derive(Debug, Clone, Deserialize)]
pub struct ContentRequest {
    #[serde(default)]
    pub content: String,
}

impl ContentRequest {
    pub fn trimmed(&self) -> &str {
        self.content.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_trimmed() {
        let body: ContentRequest = serde_json::from_str(r#"{"content":"  hello  "}"#).unwrap();
        assert_eq!(body.trimmed(), "hello");
    }

    #[test]
    fn missing_content_reads_as_blank() {
        let body: ContentRequest = serde_json::from_str("{}").unwrap();
        assert!(body.trimmed().is_empty());
    }

    #[test]
    fn populated_owner_is_nested() {
        let tweet = Tweet {
            id: Uuid::nil(),
            content: "hi".into(),
            owner: UserSummary {
                id: Uuid::nil(),
                username: "alice".into(),
                avatar: "https://cdn.example.test/a.png".into(),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let body = serde_json::to_value(&tweet).unwrap();
        assert_eq!(body["owner"]["username"], "alice");
    }
}
