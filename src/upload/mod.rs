mod job;
mod manager;
mod manager_worker;
mod poller;
mod types;
pub mod variants;

pub use job::{Job, JobId, JobStatus, VariantsState};
pub use manager::{UploadManager, UploadManagerHandle};
pub use types::{UploadConfig, UploadEvent};
pub use variants::{classify_variant, select_playback, PlaybackSources, VariantRole};
