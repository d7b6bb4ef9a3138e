//! Dedicated writer task for request frames.
//!
//! The write half of the active transport is owned by one task that receives
//! requests over an mpsc channel. A resend round can queue hundreds of
//! 2-byte frames at once; the task drains whatever is ready and writes it as
//! a single buffer.
//!
//! # Architecture
//!
//! ```text
//! Session actions ─► mpsc::Sender<Request> ─► Writer Task ─► TCP write half
//!                                                  │
//!                                     write error ─┴─► TransportEvent::Error
//! ```
//!
//! Dropping every [`WriterHandle`] closes the channel; the task then shuts
//! down the write half and exits.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{FeedError, Result};
use crate::protocol::{Request, REQUEST_SIZE};
use crate::transport::TransportEvent;

/// Maximum requests to batch in a single write.
const MAX_BATCH_SIZE: usize = 256;

/// Handle for queueing requests to the writer task.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<Request>,
}

impl WriterHandle {
    /// Queue a request for writing.
    ///
    /// Fails with `ConnectionClosed` once the writer task has exited.
    pub async fn send(&self, request: Request) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| FeedError::ConnectionClosed)
    }
}

/// Spawn the writer task and return a handle for sending requests.
///
/// Write failures are reported on `events` so the connection manager sees
/// them in the same stream as read-side errors.
pub fn spawn_writer_task<W>(
    writer: W,
    events: mpsc::Sender<TransportEvent>,
    channel_capacity: usize,
) -> (WriterHandle, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(channel_capacity);
    let task = tokio::spawn(async move {
        if let Err(e) = writer_loop(rx, writer).await {
            tracing::error!("Writer error: {}", e);
            let _ = events.send(TransportEvent::Error(e)).await;
        }
    });

    (WriterHandle { tx }, task)
}

/// Main writer loop - receives requests and writes them in batches.
async fn writer_loop<W>(mut rx: mpsc::Receiver<Request>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut batch = Vec::with_capacity(MAX_BATCH_SIZE * REQUEST_SIZE);

    loop {
        let first = match rx.recv().await {
            Some(req) => req,
            None => {
                // Channel closed, clean shutdown
                let _ = writer.shutdown().await;
                return Ok(());
            }
        };

        batch.clear();
        batch.extend_from_slice(&first.encode());
        log_request(&first);

        let mut count = 1;
        while count < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(req) => {
                    batch.extend_from_slice(&req.encode());
                    log_request(&req);
                    count += 1;
                }
                Err(_) => break,
            }
        }

        writer.write_all(&batch).await?;
        writer.flush().await?;
    }
}

fn log_request(request: &Request) {
    tracing::debug!(opcode = request.opcode(), arg = request.arg(), "sending request");
}
