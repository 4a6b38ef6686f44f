use std::path::{Path, PathBuf};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use crate::errors::{Result, StudioError};

/// Status sentinel used when the download endpoint answers 204
pub const NO_CONTENT_STATUS: &str = "NO_CONTENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    Uploaded,
    Queued,
    Processing,
    Processed,
    Failed,
}

impl VideoStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Processed | VideoStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "UPLOADED",
            VideoStatus::Queued => "QUEUED",
            VideoStatus::Processing => "PROCESSING",
            VideoStatus::Processed => "PROCESSED",
            VideoStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoVariant {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Server side video record, read only on the client
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: u64,
    pub original_file_name: String,
    pub s3_key: String,
    pub content_type: String,
    pub status: VideoStatus,
    #[serde(default)]
    pub variants: Option<Vec<VideoVariant>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadVariant {
    pub quality: String,
    /// Presigned, time limited
    pub url: String,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDownloadResponse {
    pub video_id: u64,
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub variants: Option<Vec<DownloadVariant>>,
}

impl VideoDownloadResponse {
    pub fn no_content(video_id: u64) -> Self {
        Self {
            video_id,
            status: NO_CONTENT_STATUS.to_string(),
            message: "No variants yet".to_string(),
            variants: None,
        }
    }

    pub fn has_variants(&self) -> bool {
        self.variants.as_ref().is_some_and(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PresignedUploadResponse {
    #[serde(rename = "presignedUrl")]
    pub presigned_url: String,
    pub s3key: String,
    /// The backend sends the id as a string
    #[serde(rename = "videoId")]
    pub video_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PresignedUploadRequest<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
}

#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Bytes),
    Path(PathBuf),
}

/// A file selected for upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub source: FileSource,
}

impl UploadFile {
    pub fn from_bytes(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            source: FileSource::Memory(data.into()),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StudioError::InvalidFile(format!("Can't read file name of {}", path.display())))?
            .to_string();

        Ok(Self {
            content_type: content_type_for(path).to_string(),
            name,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Only named video files are accepted for transcoding
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StudioError::InvalidFile("Missing file name".to_string()));
        }
        if !self.content_type.starts_with("video/") {
            return Err(StudioError::InvalidFile(format!(
                "Please upload a video file, got '{}'",
                self.content_type
            )));
        }

        Ok(())
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mpg" | "mpeg" => "video/mpeg",
        "ts" => "video/mp2t",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_deserializes_from_camel_case() {
        let json = r#"{
            "id": 42,
            "originalFileName": "clip.mp4",
            "s3Key": "uploads/clip.mp4",
            "contentType": "video/mp4",
            "status": "PROCESSING"
        }"#;

        let video: Video = serde_json::from_str(json).unwrap();
        assert_eq!(video.id, 42);
        assert_eq!(video.s3_key, "uploads/clip.mp4");
        assert_eq!(video.status, VideoStatus::Processing);
        assert!(video.variants.is_none());
    }

    #[test]
    fn test_processing_download_response_with_null_variants() {
        let json = r#"{"videoId": 7, "status": "PROCESSING", "message": "Still working", "variants": null}"#;
        let resp: VideoDownloadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.video_id, 7);
        assert!(!resp.has_variants());
    }

    #[test]
    fn test_presigned_response_keeps_string_id() {
        let json = r#"{"presignedUrl": "https://store/put", "s3key": "k", "videoId": "42"}"#;
        let resp: PresignedUploadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.video_id, "42");
        assert_eq!(resp.presigned_url, "https://store/put");
    }

    #[test]
    fn test_upload_file_from_path_infers_type() {
        let file = UploadFile::from_path("/tmp/Holiday.MOV").unwrap();
        assert_eq!(file.name, "Holiday.MOV");
        assert_eq!(file.content_type, "video/quicktime");
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_video() {
        let file = UploadFile::from_bytes("notes.txt", "text/plain", "hello");
        assert!(matches!(file.validate(), Err(StudioError::InvalidFile(_))));

        let unnamed = UploadFile::from_bytes("  ", "video/mp4", "x");
        assert!(matches!(unnamed.validate(), Err(StudioError::InvalidFile(_))));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(VideoStatus::Processed.is_terminal());
        assert!(VideoStatus::Failed.is_terminal());
        assert!(!VideoStatus::Queued.is_terminal());
        assert_eq!(VideoStatus::Processing.to_string(), "PROCESSING");
    }
}
