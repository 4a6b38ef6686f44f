use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;

/// Bytes handed to the HTTP body so far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
    pub percentage: f64,
}

impl TransferProgress {
    pub fn new(bytes_sent: u64, total_bytes: u64) -> Self {
        let percentage = if total_bytes == 0 {
            100.0
        } else {
            (bytes_sent as f64 / total_bytes as f64 * 100.0).min(100.0)
        };

        Self { bytes_sent, total_bytes, percentage }
    }
}

pub type ProgressCallback = Arc<dyn Fn(TransferProgress) + Send + Sync>;

pin_project! {
    /// Wraps a body stream and reports every chunk that passes through
    pub struct ProgressStream<S> {
        #[pin]
        inner: S,
        bytes_sent: u64,
        total_bytes: u64,
        callback: ProgressCallback,
    }
}

impl<S> ProgressStream<S> {
    pub fn new(inner: S, total_bytes: u64, callback: ProgressCallback) -> Self {
        Self {
            inner,
            bytes_sent: 0,
            total_bytes,
            callback,
        }
    }
}

impl<S> Stream for ProgressStream<S>
where
    S: Stream<Item = std::io::Result<Bytes>>
{
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if !chunk.is_empty() {
                    *this.bytes_sent += chunk.len() as u64;
                    (this.callback)(TransferProgress::new(*this.bytes_sent, *this.total_bytes));
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
