use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::api::types::{DownloadVariant, VideoDownloadResponse, VideoStatus};
use crate::errors::{Result, StudioError};
use super::variants::select_playback;

/// Job identifier, temporary until the backend assigns the video id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct JobId(String);

impl JobId {
    pub fn temporary() -> Self {
        Self(format!("temp-{}", Uuid::new_v4()))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with("temp-")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric backend id
    pub fn video_id(&self) -> Result<u64> {
        self.0.parse::<u64>()
            .map_err(|_| StudioError::InvalidVideoId(self.0.clone()))
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for JobId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// 上传中
    Uploading,
    /// 已上传，等待服务端处理
    Uploaded,
    Queued,
    Processing,
    Processed,
    Failed,
}

impl JobStatus {
    fn rank(&self) -> u8 {
        match self {
            JobStatus::Uploading => 0,
            JobStatus::Uploaded => 1,
            JobStatus::Queued => 2,
            JobStatus::Processing => 3,
            JobStatus::Processed | JobStatus::Failed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Processed | JobStatus::Failed)
    }

    /// Statuses only move forward, terminal ones never change
    pub fn can_advance_to(&self, next: JobStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl From<VideoStatus> for JobStatus {
    fn from(status: VideoStatus) -> Self {
        match status {
            VideoStatus::Uploaded => JobStatus::Uploaded,
            VideoStatus::Queued => JobStatus::Queued,
            VideoStatus::Processing => JobStatus::Processing,
            VideoStatus::Processed => JobStatus::Processed,
            VideoStatus::Failed => JobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantsState {
    Loading,
    /// Finished, but nothing to download yet
    #[serde(rename = "none")]
    Empty,
    Ready,
    Error,
}

/// Client side record of one upload, kept for the session only
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub file_name: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    /// Transfer progress of the storage upload, 0-100
    pub progress: Option<f64>,
    pub variants: Option<Vec<DownloadVariant>>,
    pub variants_state: Option<VariantsState>,
    pub master_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl Job {
    pub fn new(id: JobId, file_name: impl Into<String>) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            status: JobStatus::Uploading,
            created_at: Utc::now(),
            progress: None,
            variants: None,
            variants_state: None,
            master_url: None,
            thumbnail_url: None,
        }
    }

    /// Apply a status, returning the previous one if it changed
    pub fn advance(&mut self, next: JobStatus) -> Option<JobStatus> {
        if !self.status.can_advance_to(next) {
            return None;
        }

        let old = self.status;
        self.status = next;
        Some(old)
    }

    /// Result of a download link fetch. `None` means the backend lost the video.
    pub fn apply_download_links(&mut self, response: Option<VideoDownloadResponse>) -> VariantsState {
        let state = match response {
            None => VariantsState::Error,
            Some(resp) if !resp.has_variants() => VariantsState::Empty,
            Some(resp) => {
                let variants = resp.variants.unwrap_or_default();
                let sources = select_playback(&variants);
                self.master_url = sources.master_url;
                self.thumbnail_url = sources.poster_url;
                self.variants = Some(variants);
                VariantsState::Ready
            }
        };

        self.variants_state = Some(state);
        state
    }

    pub fn is_playable(&self) -> bool {
        self.variants_state == Some(VariantsState::Ready) && self.master_url.is_some()
    }
}
