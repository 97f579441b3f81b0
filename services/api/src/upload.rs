//! Multipart form staging
//!
//! File parts land in temp files under the configured upload directory and
//! are removed when their [`StagedFile`] drops.

use axum::extract::{Multipart, multipart::Field};
use media::{MediaUploader, UploadedAsset};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// A file part written to local disk
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    pub original_name: String,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the temp file now, logging a failed removal
    pub fn discard(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!("Failed to remove staged upload {}: {}", path.display(), e);
        }
    }

    /// Push the file to the media host and clean it up either way
    pub async fn host(self, uploader: &MediaUploader) -> Option<UploadedAsset> {
        let asset = uploader.upload(self.path()).await;
        self.discard();
        asset
    }
}

/// Text fields and staged files of one multipart request
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, StagedFile>,
}

impl UploadForm {
    /// Drain a multipart body, staging file parts into `temp_dir`
    pub async fn read(mut multipart: Multipart, temp_dir: &Path) -> ApiResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(original_name) if !original_name.is_empty() => {
                    match stage(temp_dir, &original_name, field).await? {
                        Some(file) => {
                            form.files.insert(name, StagedFile { file, original_name });
                        }
                        None => debug!("Skipping empty file part '{}'", name),
                    }
                }
                Some(_) => debug!("Skipping unnamed file part '{}'", name),
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed text field; blank counts as absent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Untrimmed text field, empty when absent
    pub fn raw(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// Trimmed text field, empty when absent
    pub fn text_or_empty(&self, name: &str) -> &str {
        self.text(name).unwrap_or("")
    }

    pub fn take_file(&mut self, name: &str) -> Option<StagedFile> {
        self.files.remove(name)
    }
}

/// Assets hosted while serving one request
///
/// If the request fails after uploading, [`HostedAssets::discard`] removes
/// everything pushed so far.
pub struct HostedAssets<'a> {
    uploader: &'a MediaUploader,
    public_ids: Vec<String>,
}

impl<'a> HostedAssets<'a> {
    pub fn new(uploader: &'a MediaUploader) -> Self {
        Self {
            uploader,
            public_ids: Vec::new(),
        }
    }

    /// Host a staged file and remember it for cleanup
    pub async fn host(&mut self, file: StagedFile) -> Option<UploadedAsset> {
        let asset = file.host(self.uploader).await?;
        self.track(&asset.public_id);
        Some(asset)
    }

    fn track(&mut self, public_id: &str) {
        self.public_ids.push(public_id.to_string());
    }

    /// Delete every asset hosted so far
    pub async fn discard(self) {
        for public_id in &self.public_ids {
            discard_hosted(self.uploader, public_id).await;
        }
    }
}

/// Delete a hosted asset, logging failure
pub async fn discard_hosted(uploader: &MediaUploader, public_id: &str) {
    if let Err(e) = uploader.delete(public_id).await {
        warn!("Failed to delete hosted asset {}: {}", public_id, e);
    }
}

/// Write a file part to disk chunk by chunk; `None` when it carried no bytes
async fn stage(
    temp_dir: &Path,
    original_name: &str,
    mut field: Field<'_>,
) -> ApiResult<Option<NamedTempFile>> {
    let suffix = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    let file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&suffix)
        .tempfile_in(temp_dir)
        .map_err(|e| staging_error(temp_dir.to_path_buf(), e))?;

    let mut out = tokio::fs::OpenOptions::new()
        .write(true)
        .open(file.path())
        .await
        .map_err(|e| staging_error(file.path().to_path_buf(), e))?;

    let mut written = 0usize;
    while let Some(chunk) = field.chunk().await? {
        out.write_all(&chunk)
            .await
            .map_err(|e| staging_error(file.path().to_path_buf(), e))?;
        written += chunk.len();
    }
    out.flush()
        .await
        .map_err(|e| staging_error(file.path().to_path_buf(), e))?;

    Ok((written > 0).then_some(file))
}

fn staging_error(path: PathBuf, e: std::io::Error) -> ApiError {
    ApiError::Internal(format!("Failed to stage upload at {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::{
        body::Body,
        extract::{FromRequest, Request},
    };

    const BOUNDARY: &str = "X-BOUNDARY";

    async fn multipart(body: &'static str) -> Multipart {
        let request = Request::builder()
            .method("POST")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body.replace('\n', "\r\n")))
            .unwrap();

        Multipart::from_request(request, &()).await.unwrap()
    }

    const FORM: &str = "--X-BOUNDARY
Content-Disposition: form-data; name=\"title\"

  Hello  
--X-BOUNDARY
Content-Disposition: form-data; name=\"avatar\"; filename=\"me.PNG\"
Content-Type: image/png

PNGDATA
--X-BOUNDARY
Content-Disposition: form-data; name=\"coverImage\"; filename=\"\"
Content-Type: application/octet-stream


--X-BOUNDARY--
";

    #[tokio::test]
    async fn fields_and_files_are_separated() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = UploadForm::read(multipart(FORM).await, dir.path())
            .await
            .unwrap();

        assert_eq!(form.text("title"), Some("Hello"));
        assert_eq!(form.text("description"), None);
        assert_eq!(form.text_or_empty("description"), "");
        assert!(form.take_file("coverImage").is_none());

        let avatar = form.take_file("avatar").unwrap();
        assert_eq!(avatar.original_name, "me.PNG");
        assert!(avatar.path().starts_with(dir.path()));
        assert_eq!(avatar.path().extension().unwrap(), "PNG");
        assert_eq!(std::fs::read(avatar.path()).unwrap(), b"PNGDATA");
    }

    #[tokio::test]
    async fn staged_files_are_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = UploadForm::read(multipart(FORM).await, dir.path())
            .await
            .unwrap();

        let path = form.take_file("avatar").unwrap().path().to_path_buf();
        assert!(!path.exists());

        drop(form);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn zero_byte_file_parts_leave_nothing_behind() {
        const EMPTY: &str = "--X-BOUNDARY
Content-Disposition: form-data; name=\"thumbnail\"; filename=\"thumb.jpg\"
Content-Type: image/jpeg


--X-BOUNDARY--
";
        let dir = tempfile::tempdir().unwrap();
        let mut form = UploadForm::read(multipart(EMPTY).await, dir.path())
            .await
            .unwrap();

        assert!(form.take_file("thumbnail").is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_host_is_not_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = UploadForm::read(multipart(FORM).await, dir.path())
            .await
            .unwrap();
        let state = AppState::offline();
        let mut hosted = HostedAssets::new(&state.media);

        let avatar = form.take_file("avatar").unwrap();
        std::fs::remove_file(avatar.path()).unwrap();
        assert!(hosted.host(avatar).await.is_none());
        assert!(hosted.public_ids.is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn discard_covers_every_tracked_asset() {
        let state = AppState::offline();
        let mut hosted = HostedAssets::new(&state.media);
        hosted.track("uploads/video.mp4");
        hosted.track("uploads/thumb.jpg");

        assert_eq!(hosted.public_ids, ["uploads/video.mp4", "uploads/thumb.jpg"]);
        hosted.discard().await;
    }

    #[tokio::test]
    async fn discard_removes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = UploadForm::read(multipart(FORM).await, dir.path())
            .await
            .unwrap();

        let avatar = form.take_file("avatar").unwrap();
        let path = avatar.path().to_path_buf();
        assert!(path.exists());

        avatar.discard();
        assert!(!path.exists());
    }
}
