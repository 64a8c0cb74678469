//! Channel-backed pipes between a producer task and a consumer stream.

use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, UnboundedReceiverStream};

/// Writing half of a bounded pipe. Dropping it closes the stream.
#[derive(Debug)]
pub struct PipeWriter<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Clone for PipeWriter<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send> PipeWriter<T> {
    /// Wait for capacity and send. Returns `false` once the reader is gone.
    pub async fn send(&self, item: T) -> bool {
        self.tx.send(item).await.is_ok()
    }
}

/// A bounded pipe; `send` waits while `capacity` items are unread.
pub fn pipe<T>(capacity: usize) -> (PipeWriter<T>, ReceiverStream<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (PipeWriter { tx }, ReceiverStream::new(rx))
}

/// A pipe that never blocks the writer.
pub fn unbounded_pipe<T>() -> (mpsc::UnboundedSender<T>, UnboundedReceiverStream<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, UnboundedReceiverStream::new(rx))
}
