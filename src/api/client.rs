use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tokio::fs::File as TokioFile;
use tokio::time::Instant;
use tokio_util::io::ReaderStream;
use url::Url;
use crate::config::{get_config, ApiConfig};
use crate::errors::{Result, StudioError};
use super::progress_stream::{ProgressCallback, ProgressStream};
use super::traits::VideoApi;
use super::types::{
    FileSource, PresignedUploadRequest, PresignedUploadResponse, UploadFile, Video, VideoDownloadResponse,
    VideoStatus,
};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    upload_timeout: Option<Duration>,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        // 整体超时按请求设置, 上传可能远超 API 调用时长
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout,
            upload_timeout: config.upload_timeout,
            poll_interval: config.poll_interval,
            poll_timeout: config.poll_timeout,
        })
    }

    /// Client for the base URL found in the environment
    pub fn from_env() -> Result<Self> {
        Self::new(&get_config())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Backend API call bounded by the request timeout
    fn api_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.endpoint(path))
            .timeout(self.request_timeout)
    }

    async fn error_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    pub async fn health_check(&self) -> Result<String> {
        let response = self.api_request(Method::GET, "/health").send().await?;

        if !response.status().is_success() {
            return Err(StudioError::server_error(response.status().as_u16(), "Health check failed"));
        }

        Ok(response.text().await?)
    }

    pub async fn request_presigned_upload(&self, file: &UploadFile) -> Result<PresignedUploadResponse> {
        let body = PresignedUploadRequest {
            file_name: &file.name,
            content_type: &file.content_type,
        };

        let response = self
            .api_request(Method::POST, "/api/video/upload-url")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = ApiClient::error_body(response).await;
            return Err(StudioError::server_error(
                status.as_u16(),
                format!("Failed to get upload URL ({}): {}", status.as_u16(), detail),
            ));
        }

        Ok(response.json().await?)
    }

    pub async fn put_file_to_presigned_url(
        &self,
        presigned_url: &str,
        file: &UploadFile,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        let url = Url::parse(presigned_url)
            .map_err(|_| StudioError::ParamError(format!("Invalid presigned url: {:?}", presigned_url)))?;

        let (body, length) = match &file.source {
            FileSource::Memory(data) => {
                let length = data.len() as u64;
                let body = match progress {
                    Some(callback) => {
                        let chunks = chunk_bytes(data.clone());
                        Body::wrap_stream(ProgressStream::new(futures::stream::iter(chunks), length, callback))
                    }
                    None => Body::from(data.clone()),
                };
                (body, length)
            }
            FileSource::Path(path) => {
                let length = tokio::fs::metadata(path).await?.len();
                let file_handle = TokioFile::open(path).await?;
                let reader_stream = ReaderStream::with_capacity(file_handle, UPLOAD_CHUNK_SIZE);
                let body = match progress {
                    Some(callback) => Body::wrap_stream(ProgressStream::new(reader_stream, length, callback)),
                    None => Body::wrap_stream(reader_stream),
                };
                (body, length)
            }
        };

        let mut request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, &file.content_type)
            .header(CONTENT_LENGTH, length)
            .body(body);
        if let Some(timeout) = self.upload_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::server_error(
                status.as_u16(),
                format!("Upload to storage failed ({})", status.as_u16()),
            ));
        }

        Ok(())
    }

    pub async fn get_video(&self, id: u64) -> Result<Option<Video>> {
        let response = self.api_request(Method::GET, &format!("/api/videos/{}", id)).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StudioError::server_error(
                status.as_u16(),
                format!("Failed to fetch video ({})", status.as_u16()),
            ));
        }

        Ok(Some(response.json().await?))
    }

    pub async fn get_videos_by_status(&self, status: VideoStatus) -> Result<Vec<Video>> {
        let response = self
            .api_request(Method::GET, &format!("/api/videos/status/{}", status.as_str()))
            .send()
            .await?;

        let code = response.status();
        if !code.is_success() {
            return Err(StudioError::server_error(
                code.as_u16(),
                format!("Failed to fetch videos by status ({})", code.as_u16()),
            ));
        }

        Ok(response.json().await?)
    }

    pub async fn delete_video(&self, s3_key: &str) -> Result<()> {
        let response = self
            .api_request(Method::DELETE, "/api/video/delete")
            .query(&[("s3Key", s3_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::server_error(
                status.as_u16(),
                format!("Failed to delete video ({})", status.as_u16()),
            ));
        }

        Ok(())
    }

    /// Download links for the transcoded outputs.
    ///
    /// 404 maps to `None`, 204 to a synthetic `NO_CONTENT` payload, and both
    /// 202 (still processing) and 200 (finished) bodies are returned as sent.
    pub async fn get_video_download_links(&self, id: u64) -> Result<Option<VideoDownloadResponse>> {
        let response = self
            .api_request(Method::GET, &format!("/api/video/{}/download", id))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::NO_CONTENT => Ok(Some(VideoDownloadResponse::no_content(id))),
            StatusCode::ACCEPTED => Ok(Some(response.json().await?)),
            status if !status.is_success() => Err(StudioError::server_error(
                status.as_u16(),
                format!("Failed to get download links ({})", status.as_u16()),
            )),
            _ => Ok(Some(response.json().await?)),
        }
    }

    /// `poll_video_status` with the configured interval and timeout
    pub async fn wait_for_video(&self, id: u64) -> Result<Option<Video>> {
        self.poll_video_status(id, self.poll_interval, self.poll_timeout).await
    }

    /// Wait for a video to reach `PROCESSED` or `FAILED`.
    ///
    /// Returns `None` as soon as the backend stops knowing the video.
    pub async fn poll_video_status(&self, id: u64, interval: Duration, timeout: Duration) -> Result<Option<Video>> {
        let start = Instant::now();

        while start.elapsed() < timeout {
            let video = match self.get_video(id).await? {
                Some(video) => video,
                None => return Ok(None),
            };

            if video.status.is_terminal() {
                return Ok(Some(video));
            }

            tracing::debug!(video_id = id, status = %video.status, "video not finished yet");
            tokio::time::sleep(interval).await;
        }

        Err(StudioError::PollTimeout {
            video_id: id,
            elapsed: start.elapsed(),
        })
    }
}

fn chunk_bytes(data: Bytes) -> Vec<std::io::Result<Bytes>> {
    let mut chunks = Vec::with_capacity(data.len() / UPLOAD_CHUNK_SIZE + 1);
    let mut offset = 0;

    while offset < data.len() {
        let end = (offset + UPLOAD_CHUNK_SIZE).min(data.len());
        chunks.push(Ok(data.slice(offset..end)));
        offset = end;
    }

    chunks
}

#[async_trait]
impl VideoApi for ApiClient {
    async fn request_presigned_upload(&self, file: &UploadFile) -> Result<PresignedUploadResponse> {
        ApiClient::request_presigned_upload(self, file).await
    }

    async fn put_file_to_presigned_url(
        &self,
        presigned_url: &str,
        file: &UploadFile,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        ApiClient::put_file_to_presigned_url(self, presigned_url, file, progress).await
    }

    async fn get_video(&self, id: u64) -> Result<Option<Video>> {
        ApiClient::get_video(self, id).await
    }

    async fn get_video_download_links(&self, id: u64) -> Result<Option<VideoDownloadResponse>> {
        ApiClient::get_video_download_links(self, id).await
    }
}
