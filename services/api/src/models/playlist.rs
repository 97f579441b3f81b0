//! Playlist model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Playlist; `V` is a video id or a populated video
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist<V = Uuid> {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub owner: Uuid,
    /// Videos in playlist order
    pub videos: Vec<V>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored playlist row without its membership
#[derive(Debug, Clone, FromRow)]
pub struct PlaylistRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_public: bool,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlaylistRecord {
    pub fn with_videos<V>(self, videos: Vec<V>) -> Playlist<V> {
        Playlist {
            id: self.id,
            name: self.name,
            description: self.description,
            is_public: self.is_public,
            owner: self.owner_id,
            videos,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

/// Partial playlist edit; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

impl UpdatePlaylistRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_public.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlists_are_public_unless_stated() {
        let body: CreatePlaylistRequest =
            serde_json::from_str(r#"{"name":"Later","description":"watch later"}"#).unwrap();
        assert!(body.is_public);

        let body: CreatePlaylistRequest =
            serde_json::from_str(r#"{"name":"Mine","description":"x","isPublic":false}"#)
                .unwrap();
        assert!(!body.is_public);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdatePlaylistRequest::default().is_empty());

        let body: UpdatePlaylistRequest = serde_json::from_str(r#"{"isPublic":false}"#).unwrap();
        assert!(!body.is_empty());
    }
}
