//! Likes on videos, comments and tweets

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Row, postgres::PgRow};

use super::{UserSummary, video::Video};

/// What a like points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Video,
    Comment,
    Tweet,
}

impl LikeTarget {
    /// Column in `likes` holding the target id
    pub fn column(&self) -> &'static str {
        match self {
            Self::Video => "video_id",
            Self::Comment => "comment_id",
            Self::Tweet => "tweet_id",
        }
    }

    /// Table the target lives in
    pub fn table(&self) -> &'static str {
        match self {
            Self::Video => "videos",
            Self::Comment => "comments",
            Self::Tweet => "tweets",
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Comment => "Comment",
            Self::Tweet => "Tweet",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LikeStatus {
    pub liked: bool,
}

/// Video liked by the viewer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideo {
    pub liked_at: DateTime<Utc>,
    pub video: Video<UserSummary>,
}

impl<'r> FromRow<'r, PgRow> for LikedVideo {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            liked_at: row.try_get("liked_at")?,
            video: Video::<UserSummary>::from_row(row)?,
        })
    }
}
