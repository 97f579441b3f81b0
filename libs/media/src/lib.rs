//! Media upload client
//!
//! Pushes locally staged files to an S3-compatible bucket and hands back the
//! public URL and asset identifier the rest of the platform stores.

pub mod metadata_extractor;
pub mod uploader;

pub use uploader::{MediaConfig, MediaError, MediaUploader, UploadedAsset};
