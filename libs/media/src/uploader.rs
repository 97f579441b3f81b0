//! S3-backed media upload client
//!
//! Uploads a staged local file, returning its public URL and the object key
//! that later identifies it for deletion. Callers own the staged file and
//! remove it whatever the outcome.

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    primitives::{ByteStream, ByteStreamError},
};
use mime_guess::mime;
use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::metadata_extractor::MetadataExtractor;

/// Errors raised while talking to the media host
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media configuration error: {0}")]
    Configuration(String),

    #[error("Failed to read staged file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: ByteStreamError,
    },

    #[error("Object storage request failed: {0}")]
    Storage(String),
}

/// Media host configuration
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Bucket receiving uploads
    pub bucket: String,
    /// Base URL under which uploaded objects are publicly served
    pub public_base_url: String,
    /// Key prefix for every uploaded object
    pub key_prefix: String,
}

impl MediaConfig {
    /// Create a new MediaConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MEDIA_BUCKET_NAME`: Target bucket (default: "media-bucket")
    /// - `MEDIA_PUBLIC_BASE_URL`: Public URL base (default: the bucket's S3 URL)
    /// - `MEDIA_KEY_PREFIX`: Object key prefix (default: "uploads")
    pub fn from_env() -> Result<Self, MediaError> {
        let bucket = env::var("MEDIA_BUCKET_NAME").unwrap_or_else(|_| "media-bucket".to_string());
        if bucket.trim().is_empty() {
            return Err(MediaError::Configuration(
                "MEDIA_BUCKET_NAME must not be empty".to_string(),
            ));
        }

        let public_base_url = env::var("MEDIA_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", bucket));

        let key_prefix = env::var("MEDIA_KEY_PREFIX").unwrap_or_else(|_| "uploads".to_string());

        Ok(Self {
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            key_prefix: key_prefix.trim_matches('/').to_string(),
        })
    }

    /// Build a fresh object key, keeping the staged file's extension
    pub fn object_key(&self, local_path: &Path) -> String {
        let name = match local_path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
            None => Uuid::new_v4().to_string(),
        };

        if self.key_prefix.is_empty() {
            name
        } else {
            format!("{}/{}", self.key_prefix, name)
        }
    }

    /// Public URL for an object key
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

/// A file hosted by the media host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
    /// Playback length in seconds, for audio and video
    pub duration: Option<f64>,
}

/// Stream a staged file from disk instead of loading it whole
async fn open_body(local_path: &Path) -> Result<ByteStream, MediaError> {
    ByteStream::from_path(local_path)
        .await
        .map_err(|source| MediaError::Io {
            path: local_path.display().to_string(),
            source,
        })
}

/// Media upload client
#[derive(Clone)]
pub struct MediaUploader {
    s3_client: Client,
    config: MediaConfig,
}

impl MediaUploader {
    pub fn new(s3_client: Client, config: MediaConfig) -> Self {
        Self { s3_client, config }
    }

    /// Build a client from the standard AWS environment chain
    pub async fn from_env(config: MediaConfig) -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(Client::new(&sdk_config), config)
    }

    /// Upload a staged file
    ///
    /// Returns `None` when the upload fails; the failure is logged here.
    pub async fn upload(&self, local_path: &Path) -> Option<UploadedAsset> {
        match self.try_upload(local_path).await {
            Ok(asset) => {
                info!("Uploaded {} as {}", local_path.display(), asset.public_id);
                Some(asset)
            }
            Err(e) => {
                error!("Upload of {} failed: {}", local_path.display(), e);
                None
            }
        }
    }

    async fn try_upload(&self, local_path: &Path) -> Result<UploadedAsset, MediaError> {
        let content_type = mime_guess::from_path(local_path).first_or_octet_stream();

        let body = open_body(local_path).await?;

        let duration = if content_type.type_() == mime::VIDEO || content_type.type_() == mime::AUDIO
        {
            match MetadataExtractor::extract_metadata(local_path).await {
                Ok(metadata) => metadata.duration,
                Err(e) => {
                    warn!("Could not probe {}: {}", local_path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        let key = self.config.object_key(local_path);

        self.s3_client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(body)
            .content_type(content_type.essence_str())
            .send()
            .await
            .map_err(|e| MediaError::Storage(e.to_string()))?;

        Ok(UploadedAsset {
            url: self.config.public_url(&key),
            public_id: key,
            duration,
        })
    }

    /// Remove a hosted asset by its public id
    pub async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        info!("Deleting hosted asset: {}", public_id);

        self.s3_client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(public_id)
            .send()
            .await
            .map_err(|e| MediaError::Storage(e.to_string()))?;

        Ok(())
    }
}
