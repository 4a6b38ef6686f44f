pub mod api;
pub mod config;
pub mod errors;
pub mod notify;
pub mod player;
pub mod upload;

pub use api::{ApiClient, VideoApi};
pub use api::types::{DownloadVariant, UploadFile, Video, VideoDownloadResponse, VideoStatus};
pub use config::ApiConfig;
pub use errors::{Result, StudioError};
pub use notify::{Notification, Severity};
pub use player::VideoPlayer;
pub use upload::{Job, JobId, JobStatus, UploadConfig, UploadEvent, UploadManager, UploadManagerHandle, VariantsState};

#[cfg(test)]
mod tests;
