use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use crate::api::types::{PresignedUploadResponse, UploadFile, Video, VideoDownloadResponse, VideoStatus};
use crate::api::{ProgressCallback, TransferProgress, VideoApi};
use crate::errors::{Result, StudioError};
use crate::notify::Notification;
use super::job::{Job, JobId, JobStatus, VariantsState};
use super::poller::StatusPoller;
use super::types::{ManagerCommand, UploadConfig, UploadEvent, WorkerMessage};

struct PollerHandle {
    cancellation_token: CancellationToken,
    join_handle: JoinHandle<()>,
}

/// Sole owner of the job list.
///
/// Commands and results of spawned network calls are handled one at a time
/// on this task, so every update starts from the current list.
pub struct UploadManagerWorker {
    api: Arc<dyn VideoApi>,
    config: UploadConfig,
    /// Newest first
    jobs: Vec<Job>,
    pollers: HashMap<JobId, PollerHandle>,
    pending_submits: HashMap<JobId, oneshot::Sender<Result<JobId>>>,

    event_tx: broadcast::Sender<UploadEvent>,
    message_tx: mpsc::UnboundedSender<WorkerMessage>,
}

impl UploadManagerWorker {
    pub(crate) async fn run(
        api: Arc<dyn VideoApi>,
        config: UploadConfig,
        mut command_rx: mpsc::Receiver<ManagerCommand>,
        event_tx: broadcast::Sender<UploadEvent>,
    ) {
        let (message_tx, mut message_rx) = mpsc::unbounded_channel();
        let mut worker = Self {
            api,
            config,
            jobs: Vec::new(),
            pollers: HashMap::new(),
            pending_submits: HashMap::new(),
            event_tx,
            message_tx,
        };

        let mut shutdown_reply = None;

        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    match command {
                        Some(ManagerCommand::Shutdown { reply }) => {
                            shutdown_reply = Some(reply);
                            break;
                        }
                        Some(command) => worker.handle_command(command),
                        // 所有句柄都已释放
                        None => break,
                    }
                }
                Some(message) = message_rx.recv() => {
                    worker.handle_message(message);
                }
            }
        }

        worker.teardown().await;

        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    fn handle_command(&mut self, command: ManagerCommand) {
        match command {
            ManagerCommand::Submit { file, reply } => {
                self.submit(file, reply);
            }
            ManagerCommand::FetchVariants { job_id, reply } => {
                let _ = reply.send(self.fetch_variants(&job_id));
            }
            ManagerCommand::StartPolling { job_id, reply } => {
                let _ = reply.send(self.start_polling(&job_id));
            }
            ManagerCommand::StopPolling { job_id, reply } => {
                let _ = reply.send(self.stop_polling(&job_id));
            }
            ManagerCommand::GetJob { job_id, reply } => {
                let _ = reply.send(self.job(&job_id).cloned());
            }
            ManagerCommand::GetAllJobs { reply } => {
                let _ = reply.send(self.jobs.clone());
            }
            ManagerCommand::ActivePollers { reply } => {
                let _ = reply.send(self.pollers.keys().cloned().collect());
            }
            ManagerCommand::Dismiss { job_id, reply } => {
                let _ = reply.send(self.dismiss(&job_id));
            }
            ManagerCommand::Shutdown { .. } => unreachable!("handled by the run loop"),
        }
    }

    fn handle_message(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::UploadProgress { job_id, progress } => {
                self.apply_progress(job_id, progress);
            }
            WorkerMessage::UploadFinished { job_id, result } => {
                self.finish_upload(job_id, result);
            }
            WorkerMessage::Snapshot { job_id, video } => {
                self.apply_snapshot(job_id, video);
            }
            WorkerMessage::VariantsFetched { job_id, result } => {
                self.apply_variants(job_id, result);
            }
        }
    }

    fn job(&self, job_id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| &job.id == job_id)
    }

    fn job_mut(&mut self, job_id: &JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|job| &job.id == job_id)
    }

    fn submit(&mut self, file: UploadFile, reply: oneshot::Sender<Result<JobId>>) {
        if let Err(err) = file.validate() {
            self.notify(Notification::error("Invalid file type").with_description(err.to_string()));
            let _ = reply.send(Err(err));
            return;
        }

        if self.jobs.iter().any(|job| job.status == JobStatus::Uploading) {
            let _ = reply.send(Err(StudioError::UploadInProgress));
            return;
        }

        let job_id = JobId::temporary();
        self.jobs.insert(0, Job::new(job_id.clone(), file.name.clone()));
        self.pending_submits.insert(job_id.clone(), reply);
        self.emit(UploadEvent::JobAdded {
            job_id: job_id.clone(),
            file_name: file.name.clone(),
        });

        tracing::info!(job_id = %job_id, file_name = %file.name, "starting upload");

        let api = self.api.clone();
        let message_tx = self.message_tx.clone();
        let progress: ProgressCallback = {
            let message_tx = message_tx.clone();
            let job_id = job_id.clone();
            Arc::new(move |progress: TransferProgress| {
                let _ = message_tx.send(WorkerMessage::UploadProgress {
                    job_id: job_id.clone(),
                    progress,
                });
            })
        };

        tokio::spawn(async move {
            let result = upload_to_storage(api.as_ref(), &file, progress).await;
            let _ = message_tx.send(WorkerMessage::UploadFinished { job_id, result });
        });
    }

    fn apply_progress(&mut self, job_id: JobId, progress: TransferProgress) {
        let Some(job) = self.job_mut(&job_id) else {
            return;
        };
        if job.status != JobStatus::Uploading {
            return;
        }

        job.progress = Some(progress.percentage);
        self.emit(UploadEvent::UploadProgress { job_id, progress });
    }

    fn finish_upload(&mut self, temp_id: JobId, result: Result<PresignedUploadResponse>) {
        let reply = self.pending_submits.remove(&temp_id);

        let outcome = result.and_then(|presigned| self.mark_uploaded(&temp_id, presigned));
        if let Err(err) = &outcome {
            tracing::error!(job_id = %temp_id, error = %err, "upload failed");
            self.set_status(&temp_id, JobStatus::Failed);
            self.notify(Notification::error("Upload failed").with_description(err.to_string()));
        }

        if let Some(reply) = reply {
            let _ = reply.send(outcome);
        }
    }

    fn mark_uploaded(&mut self, temp_id: &JobId, presigned: PresignedUploadResponse) -> Result<JobId> {
        let new_id = JobId::from(presigned.video_id);
        // 无法轮询的 id 视为上传失败
        new_id.video_id()?;

        let Some(job) = self.job_mut(temp_id) else {
            return Err(StudioError::internal_error(format!("Job {} disappeared during upload", temp_id)));
        };
        job.id = new_id.clone();
        job.progress = Some(100.0);
        let old_status = job.advance(JobStatus::Uploaded);

        self.emit(UploadEvent::JobRenamed {
            old_id: temp_id.clone(),
            new_id: new_id.clone(),
        });
        if let Some(old_status) = old_status {
            self.emit(UploadEvent::StatusChanged {
                job_id: new_id.clone(),
                old_status,
                new_status: JobStatus::Uploaded,
            });
        }
        self.notify(Notification::info("Upload complete").with_description("Waiting for processing to start"));

        tracing::info!(job_id = %new_id, s3_key = %presigned.s3key, "upload stored");

        if let Err(err) = self.start_polling(&new_id) {
            tracing::warn!(job_id = %new_id, error = %err, "can't poll uploaded job");
        }

        Ok(new_id)
    }

    fn set_status(&mut self, job_id: &JobId, status: JobStatus) {
        let Some(job) = self.job_mut(job_id) else {
            return;
        };

        match job.advance(status) {
            Some(old_status) => {
                self.emit(UploadEvent::StatusChanged {
                    job_id: job_id.clone(),
                    old_status,
                    new_status: status,
                });
            }
            None => {
                if job.status != status {
                    tracing::debug!(job_id = %job_id, current = ?job.status, stale = ?status, "discarding stale status");
                }
            }
        }
    }

    /// No-op returning `false` when the job already has a poller
    fn start_polling(&mut self, job_id: &JobId) -> Result<bool> {
        if self.pollers.contains_key(job_id) {
            return Ok(false);
        }
        if self.job(job_id).is_none() {
            return Err(StudioError::ParamError(format!("Job {} not found", job_id)));
        }
        let video_id = job_id.video_id()?;

        let cancellation_token = CancellationToken::new();
        let poller = StatusPoller {
            api: self.api.clone(),
            job_id: job_id.clone(),
            video_id,
            interval: self.config.poll_interval,
            cancellation_token: cancellation_token.clone(),
            message_tx: self.message_tx.clone(),
        };

        let join_handle = tokio::spawn(poller.run());
        self.pollers.insert(job_id.clone(), PollerHandle {
            cancellation_token,
            join_handle,
        });

        tracing::debug!(job_id = %job_id, "polling started");
        Ok(true)
    }

    fn stop_polling(&mut self, job_id: &JobId) -> bool {
        match self.pollers.remove(job_id) {
            Some(handle) => {
                handle.cancellation_token.cancel();
                tracing::debug!(job_id = %job_id, "polling stopped");
                true
            }
            None => false,
        }
    }

    fn apply_snapshot(&mut self, job_id: JobId, video: Video) {
        // 已取消的轮询可能仍有结果返回
        if !self.pollers.contains_key(&job_id) || self.job(&job_id).is_none() {
            tracing::debug!(job_id = %job_id, "ignoring snapshot for inactive job");
            return;
        }

        self.set_status(&job_id, JobStatus::from(video.status));

        if video.status == VideoStatus::Processed {
            if let Err(err) = self.fetch_variants(&job_id) {
                tracing::warn!(job_id = %job_id, error = %err, "can't fetch variants");
            }
        }

        if video.status.is_terminal() {
            self.stop_polling(&job_id);

            let notification = if video.status == VideoStatus::Processed {
                Notification::info("Processing complete")
            } else {
                Notification::error("Processing failed").with_description(video.original_file_name)
            };
            self.notify(notification);
        }
    }

    fn fetch_variants(&mut self, job_id: &JobId) -> Result<()> {
        let Some(job) = self.job_mut(job_id) else {
            return Err(StudioError::ParamError(format!("Job {} not found", job_id)));
        };

        let video_id = match job_id.video_id() {
            Ok(id) => id,
            Err(err) => {
                job.variants_state = Some(VariantsState::Error);
                self.emit(UploadEvent::VariantsChanged {
                    job_id: job_id.clone(),
                    state: VariantsState::Error,
                });
                return Err(err);
            }
        };

        job.variants_state = Some(VariantsState::Loading);
        self.emit(UploadEvent::VariantsChanged {
            job_id: job_id.clone(),
            state: VariantsState::Loading,
        });

        let api = self.api.clone();
        let message_tx = self.message_tx.clone();
        let job_id = job_id.clone();
        tokio::spawn(async move {
            let result = api.get_video_download_links(video_id).await;
            let _ = message_tx.send(WorkerMessage::VariantsFetched { job_id, result });
        });

        Ok(())
    }

    fn apply_variants(&mut self, job_id: JobId, result: Result<Option<VideoDownloadResponse>>) {
        let Some(job) = self.job_mut(&job_id) else {
            return;
        };

        let state = match result {
            Ok(response) => job.apply_download_links(response),
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "fetching variants failed");
                job.variants_state = Some(VariantsState::Error);
                VariantsState::Error
            }
        };

        tracing::debug!(job_id = %job_id, state = ?state, "variants updated");
        self.emit(UploadEvent::VariantsChanged { job_id, state });
    }

    fn dismiss(&mut self, job_id: &JobId) -> Result<()> {
        let job = self.job(job_id)
            .ok_or_else(|| StudioError::ParamError(format!("Job {} not found", job_id)))?;

        if !job.status.is_terminal() {
            return Err(StudioError::ParamError(format!("Cannot dismiss job in state {:?}", job.status)));
        }

        self.stop_polling(job_id);
        self.jobs.retain(|job| &job.id != job_id);
        Ok(())
    }

    /// Cancel every poller and wait for them to finish
    async fn teardown(&mut self) {
        let handles: Vec<_> = self.pollers.drain().map(|(_, handle)| handle).collect();
        for handle in &handles {
            handle.cancellation_token.cancel();
        }
        for handle in handles {
            let _ = handle.join_handle.await;
        }

        for (_, reply) in self.pending_submits.drain() {
            let _ = reply.send(Err(StudioError::ManagerShutdown));
        }

        tracing::debug!(jobs = self.jobs.len(), "upload manager stopped");
    }

    fn notify(&self, notification: Notification) {
        self.emit(UploadEvent::Notify(notification));
    }

    fn emit(&self, event: UploadEvent) {
        let _ = self.event_tx.send(event);
    }
}

async fn upload_to_storage(
    api: &dyn VideoApi,
    file: &UploadFile,
    progress: ProgressCallback,
) -> Result<PresignedUploadResponse> {
    let presigned = api.request_presigned_upload(file).await?;
    tracing::debug!(video_id = %presigned.video_id, "presigned URL received");

    api.put_file_to_presigned_url(&presigned.presigned_url, file, Some(progress)).await?;
    Ok(presigned)
}
