mod client;
mod progress_stream;
mod traits;
pub mod types;

pub use client::ApiClient;
pub use progress_stream::{ProgressCallback, ProgressStream, TransferProgress};
pub use traits::VideoApi;
