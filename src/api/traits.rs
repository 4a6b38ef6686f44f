use async_trait::async_trait;
use crate::errors::Result;
use super::progress_stream::ProgressCallback;
use super::types::{PresignedUploadResponse, UploadFile, Video, VideoDownloadResponse};

/// Backend calls the upload orchestrator depends on
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// Ask the backend for a presigned storage slot
    async fn request_presigned_upload(&self, file: &UploadFile) -> Result<PresignedUploadResponse>;

    /// Send the raw file to object storage
    async fn put_file_to_presigned_url(
        &self,
        presigned_url: &str,
        file: &UploadFile,
        progress: Option<ProgressCallback>,
    ) -> Result<()>;

    /// `None` when the video is unknown to the backend
    async fn get_video(&self, id: u64) -> Result<Option<Video>>;

    /// `None` when the video is unknown to the backend
    async fn get_video_download_links(&self, id: u64) -> Result<Option<VideoDownloadResponse>>;
}
