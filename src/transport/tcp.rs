//! TCP connection with reader/writer tasks.
//!
//! # Example
//!
//! ```ignore
//! use seqfeed_client::transport::{connect, Connection};
//!
//! let stream = connect("localhost:3000").await?;
//! let mut conn = Connection::open(stream, 64 * 1024, 1024);
//! conn.send(Request::StreamAll).await?;
//! while let Some(event) = conn.recv().await { /* ... */ }
//! ```

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::TransportEvent;
use crate::error::Result;
use crate::protocol::Request;
use crate::writer::{spawn_writer_task, WriterHandle};

/// Open a TCP connection to `addr` (`host:port`).
pub async fn connect(addr: &str) -> std::io::Result<TcpStream> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// One open transport: event receiver, writer handle and the two tasks.
///
/// Dropping the connection aborts the reader and closes the writer
/// channel, which closes the socket.
pub struct Connection {
    events: mpsc::Receiver<TransportEvent>,
    writer: WriterHandle,
    reader_task: JoinHandle<()>,
    _writer_task: JoinHandle<()>,
}

impl Connection {
    /// Split `stream` and spawn its reader and writer tasks.
    ///
    /// Sizes below 1 are raised to 1; tokio channels need a non-zero bound.
    pub fn open(stream: TcpStream, read_buffer_size: usize, channel_capacity: usize) -> Self {
        let read_buffer_size = read_buffer_size.max(1);
        let channel_capacity = channel_capacity.max(1);
        let (read_half, write_half) = stream.into_split();
        let (events_tx, events) = mpsc::channel(channel_capacity);

        let (writer, writer_task) =
            spawn_writer_task(write_half, events_tx.clone(), channel_capacity);
        let reader_task = tokio::spawn(read_loop(read_half, events_tx, read_buffer_size));

        Self {
            events,
            writer,
            reader_task,
            _writer_task: writer_task,
        }
    }

    /// Queue a request on this transport.
    pub async fn send(&self, request: Request) -> Result<()> {
        self.writer.send(request).await
    }

    /// Next event; `Closed` once both tasks are gone.
    pub async fn recv(&mut self) -> TransportEvent {
        self.events.recv().await.unwrap_or(TransportEvent::Closed)
    }

    /// Next event, or `None` if nothing arrives within `limit`.
    pub async fn recv_timeout(&mut self, limit: Duration) -> Option<TransportEvent> {
        tokio::time::timeout(limit, self.recv()).await.ok()
    }

    /// Close the transport.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// Read loop - forwards socket reads as events until EOF or error.
async fn read_loop<R>(mut reader: R, events: mpsc::Sender<TransportEvent>, buffer_size: usize)
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(buffer_size);

    loop {
        buf.reserve(buffer_size);
        let event = match reader.read_buf(&mut buf).await {
            Ok(0) => TransportEvent::Closed,
            Ok(_) => TransportEvent::Data(buf.split().freeze()),
            Err(e) => TransportEvent::Error(e.into()),
        };

        let done = !matches!(event, TransportEvent::Data(_));
        if events.send(event).await.is_err() || done {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncWriteExt};

    #[tokio::test]
    async fn test_read_loop_forwards_chunks_then_closed() {
        let (mut server, client) = duplex(64);
        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(read_loop(client, tx, 32));

        server.write_all(b"abc").await.unwrap();
        match rx.recv().await {
            Some(TransportEvent::Data(bytes)) => assert_eq!(&bytes[..], b"abc"),
            other => panic!("expected data, got {:?}", other),
        }

        drop(server);
        assert!(matches!(rx.recv().await, Some(TransportEvent::Closed)));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_roundtrip_over_tcp() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut req = [0u8; 2];
            socket.read_exact(&mut req).await.unwrap();
            socket.write_all(&[9, 9, 9]).await.unwrap();
            req
        });

        let stream = connect(&addr).await.unwrap();
        let mut conn = Connection::open(stream, 1024, 16);
        conn.send(Request::StreamAll).await.unwrap();

        let mut received = Vec::new();
        while received.len() < 3 {
            match conn.recv().await {
                TransportEvent::Data(bytes) => received.extend_from_slice(&bytes),
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(received, vec![9, 9, 9]);
        assert_eq!(server.await.unwrap(), [1, 0]);

        // Server task dropped its socket: EOF
        assert!(matches!(conn.recv().await, TransportEvent::Closed));
    }

    #[tokio::test]
    async fn test_recv_timeout_expires() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let stream = connect(&addr).await.unwrap();
        let (_socket, _) = listener.accept().await.unwrap();

        let mut conn = Connection::open(stream, 1024, 16);
        assert!(conn.recv_timeout(Duration::from_millis(20)).await.is_none());
    }

    #[tokio::test]
    async fn test_zero_sizes_are_raised_to_one() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut req = [0u8; 2];
            socket.read_exact(&mut req).await.unwrap();
            socket.write_all(&[7, 7]).await.unwrap();
            req
        });

        let stream = connect(&addr).await.unwrap();
        let mut conn = Connection::open(stream, 0, 0);
        conn.send(Request::Resend(4)).await.unwrap();

        let mut received = Vec::new();
        while received.len() < 2 {
            match conn.recv().await {
                TransportEvent::Data(bytes) => received.extend_from_slice(&bytes),
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(received, vec![7, 7]);
        assert_eq!(server.await.unwrap(), [2, 4]);
    }
}
