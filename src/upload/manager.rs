use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use crate::api::types::UploadFile;
use crate::api::VideoApi;
use crate::errors::{Result, StudioError};
use super::job::{Job, JobId};
use super::manager_worker::UploadManagerWorker;
use super::types::{ManagerCommand, UploadConfig, UploadEvent};

#[derive(Clone)]
pub struct UploadManager {
    command_tx: mpsc::Sender<ManagerCommand>,
    event_tx: broadcast::Sender<UploadEvent>,
}

/// 上传管理器句柄 - 包含管理器和工作线程
pub struct UploadManagerHandle {
    pub manager: UploadManager,
    pub worker_handle: JoinHandle<()>,
}

impl UploadManagerHandle {
    /// Stop every poller and wait for the worker to exit
    pub async fn shutdown(self) -> Result<()> {
        self.manager.shutdown().await;
        self.worker_handle.await
            .map_err(|err| StudioError::InternalError(format!("Worker panic: {}", err)))
    }
}

impl UploadManager {
    pub fn new(api: Arc<dyn VideoApi>, config: UploadConfig) -> UploadManagerHandle {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (event_tx, _) = broadcast::channel(config.event_capacity);

        let worker_handle = tokio::spawn(UploadManagerWorker::run(
            api,
            config,
            command_rx,
            event_tx.clone(),
        ));

        let manager = Self {
            command_tx,
            event_tx,
        };

        UploadManagerHandle {
            manager,
            worker_handle,
        }
    }

    async fn request<T>(&self, command: ManagerCommand, reply_rx: oneshot::Receiver<T>) -> Result<T> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| StudioError::ManagerShutdown)?;

        reply_rx
            .await
            .map_err(|_| StudioError::ManagerShutdown)
    }

    /// Upload a file and start tracking it.
    ///
    /// Resolves once the file is in object storage, with the server assigned
    /// job id. Polling for that id is already running by then.
    pub async fn submit(&self, file: UploadFile) -> Result<JobId> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(ManagerCommand::Submit { file, reply }, reply_rx).await?
    }

    /// Fetch download links again, e.g. after an error
    pub async fn fetch_variants(&self, job_id: JobId) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(ManagerCommand::FetchVariants { job_id, reply }, reply_rx).await?
    }

    /// `Ok(false)` if the job was already being polled
    pub async fn start_polling(&self, job_id: JobId) -> Result<bool> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(ManagerCommand::StartPolling { job_id, reply }, reply_rx).await?
    }

    pub async fn stop_polling(&self, job_id: JobId) -> Result<bool> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(ManagerCommand::StopPolling { job_id, reply }, reply_rx).await
    }

    pub async fn get_job(&self, job_id: JobId) -> Result<Option<Job>> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(ManagerCommand::GetJob { job_id, reply }, reply_rx).await
    }

    /// Newest first
    pub async fn get_all_jobs(&self) -> Result<Vec<Job>> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(ManagerCommand::GetAllJobs { reply }, reply_rx).await
    }

    pub async fn active_pollers(&self) -> Result<Vec<JobId>> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(ManagerCommand::ActivePollers { reply }, reply_rx).await
    }

    /// Remove a finished or failed job from the list
    pub async fn dismiss(&self, job_id: JobId) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(ManagerCommand::Dismiss { job_id, reply }, reply_rx).await?
    }

    /// Cancel all pollers. Safe to call more than once.
    pub async fn shutdown(&self) {
        let (reply, reply_rx) = oneshot::channel();
        let _ = self.request(ManagerCommand::Shutdown { reply }, reply_rx).await;
    }

    /// 订阅事件
    ///
    /// Slow subscribers may see `Lagged` and miss events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<UploadEvent> {
        self.event_tx.subscribe()
    }
}
