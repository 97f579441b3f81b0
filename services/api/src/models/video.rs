//! Video model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use uuid::Uuid;

use super::{UserSummary, owner_summary};

/// Hosted media reference
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub url: String,
    pub public_id: String,
}

/// Video entity; `O` is the owner id or the joined owner summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video<O = Uuid> {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: MediaRef,
    pub thumbnail: Option<MediaRef>,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub owner: O,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn read_video<O>(row: &PgRow, owner: O) -> Result<Video<O>, sqlx::Error> {
    let thumbnail_url: Option<String> = row.try_get("thumbnail_url")?;
    let thumbnail_public_id: Option<String> = row.try_get("thumbnail_public_id")?;

    Ok(Video {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        video_file: MediaRef {
            url: row.try_get("video_url")?,
            public_id: row.try_get("video_public_id")?,
        },
        thumbnail: thumbnail_url
            .zip(thumbnail_public_id)
            .map(|(url, public_id)| MediaRef { url, public_id }),
        duration: row.try_get("duration")?,
        views: row.try_get("views")?,
        is_published: row.try_get("is_published")?,
        owner,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl<'r> FromRow<'r, PgRow> for Video {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        read_video(row, row.try_get("owner_id")?)
    }
}

impl<'r> FromRow<'r, PgRow> for Video<UserSummary> {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        read_video(row, owner_summary(row)?)
    }
}

/// Watch history entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedVideo {
    pub watched_at: DateTime<Utc>,
    #[serde(flatten)]
    pub video: Video<UserSummary>,
}

impl<'r> FromRow<'r, PgRow> for WatchedVideo {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            watched_at: row.try_get("watched_at")?,
            video: Video::<UserSummary>::from_row(row)?,
        })
    }
}

/// New video creation payload
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_file: MediaRef,
    pub thumbnail: Option<MediaRef>,
    pub duration: f64,
    pub owner_id: Uuid,
}

/// Video edit payload
#[derive(Debug, Clone, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<MediaRef>,
}

/// Sortable video columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSort {
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSort {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("createdAt") => Some(Self::CreatedAt),
            Some("views") => Some(Self::Views),
            Some("duration") => Some(Self::Duration),
            Some("title") => Some(Self::Title),
            Some(_) => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "v.created_at",
            Self::Views => "v.views",
            Self::Duration => "v.duration",
            Self::Title => "v.title",
        }
    }
}

/// Query parameters for video listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// Case-insensitive search over title and description
    pub query: Option<String>,
    pub sort_by: Option<String>,
    /// "asc" or "desc" (default)
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

/// Resolved listing filter
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFilter {
    pub search: Option<String>,
    pub owner_id: Option<Uuid>,
    pub sort: VideoSort,
    pub ascending: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishStatus {
    pub is_published: bool,
}
