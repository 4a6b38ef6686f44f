use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use crate::api::VideoApi;
use super::job::JobId;
use super::types::WorkerMessage;

/// Periodic status fetch for one job.
///
/// Snapshots are forwarded to the manager worker, which owns the job list.
/// The poller stops on its own after forwarding a terminal snapshot, or when
/// its token is cancelled.
pub(crate) struct StatusPoller {
    pub(crate) api: Arc<dyn VideoApi>,
    pub(crate) job_id: JobId,
    pub(crate) video_id: u64,
    pub(crate) interval: Duration,
    pub(crate) cancellation_token: CancellationToken,
    pub(crate) message_tx: mpsc::UnboundedSender<WorkerMessage>,
}

impl StatusPoller {
    pub async fn run(self) {
        // 第一次请求在一个间隔之后
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = self.cancellation_token.cancelled() => break,
                result = self.api.get_video(self.video_id) => result,
            };

            match result {
                Ok(Some(video)) => {
                    let terminal = video.status.is_terminal();
                    let message = WorkerMessage::Snapshot {
                        job_id: self.job_id.clone(),
                        video,
                    };

                    if self.message_tx.send(message).is_err() || terminal {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::debug!(job_id = %self.job_id, "video not visible yet, skipping tick");
                }
                Err(err) => {
                    tracing::warn!(job_id = %self.job_id, error = %err, "polling error");
                }
            }
        }

        tracing::debug!(job_id = %self.job_id, "poller stopped");
    }
}
