use std::time::Duration;
use tokio::sync::oneshot;
use crate::api::types::{PresignedUploadResponse, UploadFile, Video, VideoDownloadResponse};
use crate::api::TransferProgress;
use crate::config::ApiConfig;
use crate::notify::Notification;
use crate::errors::Result;
use super::job::{Job, JobId, JobStatus, VariantsState};

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// 轮询间隔
    pub poll_interval: Duration,

    /// Commands buffered before callers wait
    pub command_capacity: usize,

    /// Events kept for slow subscribers
    pub event_capacity: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            command_capacity: 100,
            event_capacity: 256,
        }
    }
}

impl From<&ApiConfig> for UploadConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// A new job entered the list
    JobAdded {
        job_id: JobId,
        file_name: String,
    },

    /// The temporary id was replaced by the server id
    JobRenamed {
        old_id: JobId,
        new_id: JobId,
    },

    StatusChanged {
        job_id: JobId,
        old_status: JobStatus,
        new_status: JobStatus,
    },

    UploadProgress {
        job_id: JobId,
        progress: TransferProgress,
    },

    VariantsChanged {
        job_id: JobId,
        state: VariantsState,
    },

    Notify(Notification),
}

pub(crate) enum ManagerCommand {
    Submit {
        file: UploadFile,
        reply: oneshot::Sender<Result<JobId>>,
    },

    FetchVariants {
        job_id: JobId,
        reply: oneshot::Sender<Result<()>>,
    },

    StartPolling {
        job_id: JobId,
        reply: oneshot::Sender<Result<bool>>,
    },

    StopPolling {
        job_id: JobId,
        reply: oneshot::Sender<bool>,
    },

    GetJob {
        job_id: JobId,
        reply: oneshot::Sender<Option<Job>>,
    },

    GetAllJobs {
        reply: oneshot::Sender<Vec<Job>>,
    },

    ActivePollers {
        reply: oneshot::Sender<Vec<JobId>>,
    },

    /// 移除已结束的任务
    Dismiss {
        job_id: JobId,
        reply: oneshot::Sender<Result<()>>,
    },

    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Results coming back from spawned network work
pub(crate) enum WorkerMessage {
    UploadProgress {
        job_id: JobId,
        progress: TransferProgress,
    },

    UploadFinished {
        job_id: JobId,
        result: Result<PresignedUploadResponse>,
    },

    Snapshot {
        job_id: JobId,
        video: Video,
    },

    VariantsFetched {
        job_id: JobId,
        result: Result<Option<VideoDownloadResponse>>,
    },
}
