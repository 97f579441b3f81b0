use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;
use tracing::{error, info};

/// Probe results for an uploaded media file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub duration: Option<f64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub format: Option<String>,
}

pub struct MetadataExtractor;

impl MetadataExtractor {
    pub async fn extract_metadata(file_path: &Path) -> Result<MediaMetadata> {
        info!("Extracting metadata from file: {}", file_path.display());

        let output = Command::new("ffprobe")
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(file_path)
            .output()
            .await?;

        if !output.status.success() {
            error!("ffprobe failed with status: {:?}", output.status);
            return Err(anyhow::anyhow!("ffprobe failed"));
        }

        let ffprobe_data: serde_json::Value = serde_json::from_slice(&output.stdout)?;

        Ok(Self::parse_ffprobe_output(&ffprobe_data))
    }

    fn parse_ffprobe_output(ffprobe_data: &serde_json::Value) -> MediaMetadata {
        let mut metadata = MediaMetadata::default();

        if let Some(format) = ffprobe_data.get("format") {
            metadata.duration = format
                .get("duration")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<f64>().ok());

            metadata.format = format
                .get("format_name")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }

        let video_stream = ffprobe_data
            .get("streams")
            .and_then(|v| v.as_array())
            .and_then(|streams| {
                streams
                    .iter()
                    .find(|s| s.get("codec_type").and_then(|v| v.as_str()) == Some("video"))
            });

        if let Some(stream) = video_stream {
            metadata.width = stream.get("width").and_then(|v| v.as_i64()).map(|w| w as i32);
            metadata.height = stream.get("height").and_then(|v| v.as_i64()).map(|h| h as i32);

            // Some containers only report duration per stream
            if metadata.duration.is_none() {
                metadata.duration = stream
                    .get("duration")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse::<f64>().ok());
            }
        }

        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_format_duration_and_video_dimensions() {
        let data = json!({
            "format": { "duration": "12.480000", "format_name": "mov,mp4,m4a,3gp,3g2,mj2" },
            "streams": [
                { "codec_type": "audio", "codec_name": "aac" },
                { "codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080 }
            ]
        });

        let metadata = MetadataExtractor::parse_ffprobe_output(&data);
        assert_eq!(metadata.duration, Some(12.48));
        assert_eq!(metadata.width, Some(1920));
        assert_eq!(metadata.height, Some(1080));
        assert_eq!(metadata.format.as_deref(), Some("mov,mp4,m4a,3gp,3g2,mj2"));
    }

    #[test]
    fn falls_back_to_stream_duration() {
        let data = json!({
            "format": { "format_name": "webm" },
            "streams": [{ "codec_type": "video", "duration": "3.5", "width": 640, "height": 360 }]
        });

        let metadata = MetadataExtractor::parse_ffprobe_output(&data);
        assert_eq!(metadata.duration, Some(3.5));
    }

    #[test]
    fn empty_probe_output_yields_no_metadata() {
        let metadata = MetadataExtractor::parse_ffprobe_output(&json!({}));
        assert_eq!(metadata, MediaMetadata::default());
    }
}
