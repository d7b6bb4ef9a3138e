//! Client builder and connection manager loop.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring the client.
//! [`Client::run`] owns the transport lifecycle:
//! 1. Connect and send the stream-all request
//! 2. Feed reads into the session, writing any resend requests it asks for
//! 3. On close, back off and reconnect while gaps remain and retries are left
//! 4. Deliver the ordered records to the sink, or return the terminal error
//!
//! Events are handled strictly one at a time. The only waits are for
//! transport events and for the backoff timer, which always runs to the end.
//!
//! # Example
//!
//! ```ignore
//! use seqfeed_client::{Client, JsonFileSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut sink = JsonFileSink::new("output.json");
//!     Client::builder()
//!         .host("localhost")
//!         .port(3000)
//!         .build()
//!         .run(&mut sink)
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{FeedError, Result};
use crate::output::{RecordSink, VecSink};
use crate::protocol::Record;
use crate::session::{Action, Session, SessionEvent, SessionState};
use crate::transport::{connect, Connection, TransportEvent};

/// Builder for configuring and creating a feed client.
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Server host. Default: `localhost`
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Server port. Default: 3000
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Reconnect attempts allowed while gaps remain. Default: 5
    pub fn retry_limit(mut self, limit: u32) -> Self {
        self.config.retry_limit = limit;
        self
    }

    /// Backoff step; attempt `n` waits `n` times this. Default: 1 second
    pub fn base_backoff(mut self, delay: Duration) -> Self {
        self.config.base_backoff = delay;
        self
    }

    /// Bound on waiting for the rest of a partial record.
    ///
    /// `None` waits forever. Default: 10 seconds
    pub fn stall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.stall_timeout = timeout;
        self
    }

    /// Socket read buffer size, at least 1. Default: 64KB
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size.max(1);
        self
    }

    /// Event and writer channel capacity, at least 1. Default: 1024
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity.max(1);
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        Client {
            config: self.config,
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A feed client for one logical session.
pub struct Client {
    config: ClientConfig,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Configuration this client runs with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run the session to a terminal state.
    ///
    /// On success the sink has received the ordered records exactly once.
    /// On failure the sink is never called.
    pub async fn run<S: RecordSink>(self, sink: &mut S) -> Result<()> {
        let addr = self.config.addr();
        let mut session = Session::new(&self.config);
        let mut conn: Option<Connection> = None;
        let mut pending = VecDeque::from([SessionEvent::Start]);

        loop {
            let event = match pending.pop_front() {
                Some(event) => event,
                None => match conn.as_mut() {
                    Some(c) => {
                        let event = Self::next_event(c, &session, self.config.stall_timeout).await;
                        if matches!(event, SessionEvent::Closed) {
                            conn = None;
                        }
                        event
                    }
                    None if session.state().is_terminal() => return Ok(()),
                    None => return Err(FeedError::ConnectionClosed),
                },
            };

            for action in session.handle(event) {
                match action {
                    Action::Connect => match connect(&addr).await {
                        Ok(stream) => {
                            conn = Some(Connection::open(
                                stream,
                                self.config.read_buffer_size,
                                self.config.channel_capacity,
                            ));
                            pending.push_back(SessionEvent::Connected);
                        }
                        Err(e) => pending.push_back(SessionEvent::ConnectFailed(e)),
                    },
                    Action::Send(request) => {
                        let sent = match conn.as_ref() {
                            Some(c) => c.send(request).await,
                            None => Err(FeedError::ConnectionClosed),
                        };
                        if let Err(e) = sent {
                            pending.push_back(SessionEvent::TransportError(e));
                        }
                    }
                    Action::Close => {
                        // Close once; later errors from the same transport are moot.
                        if let Some(c) = conn.take() {
                            c.close();
                            pending.push_back(SessionEvent::Closed);
                        }
                    }
                    Action::Sleep(delay) => {
                        tokio::time::sleep(delay).await;
                        pending.push_back(SessionEvent::BackoffElapsed);
                    }
                    Action::Deliver(records) => sink.deliver(&records)?,
                    Action::Fail(err) => return Err(err),
                }
            }

            if session.state() == SessionState::Completed && pending.is_empty() {
                if let Some(c) = conn.take() {
                    c.close();
                }
                return Ok(());
            }
        }
    }

    /// Run the session and return the ordered records.
    pub async fn fetch(self) -> Result<Vec<Record>> {
        let mut sink = VecSink::default();
        self.run(&mut sink).await?;
        Ok(sink.records)
    }

    /// Wait for the next transport event, bounding the wait while a
    /// partial record is buffered.
    async fn next_event(
        conn: &mut Connection,
        session: &Session,
        stall_timeout: Option<Duration>,
    ) -> SessionEvent {
        let event = match stall_timeout {
            Some(limit) if session.has_partial_frame() => match conn.recv_timeout(limit).await {
                Some(event) => event,
                None => {
                    let buffered = session.buffered();
                    tracing::warn!(buffered, "partial record stalled");
                    TransportEvent::Error(FeedError::StalledFrame { buffered })
                }
            },
            _ => conn.recv().await,
        };

        match event {
            TransportEvent::Data(bytes) => SessionEvent::Data(bytes),
            TransportEvent::Error(err) => SessionEvent::TransportError(err),
            TransportEvent::Closed => SessionEvent::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let client = ClientBuilder::default().build();
        assert_eq!(client.config().addr(), "localhost:3000");
        assert_eq!(client.config().retry_limit, 5);
    }

    #[test]
    fn test_builder_configuration() {
        let client = Client::builder()
            .host("10.0.0.1")
            .port(4000)
            .retry_limit(2)
            .base_backoff(Duration::from_millis(50))
            .stall_timeout(None)
            .read_buffer_size(512)
            .channel_capacity(8)
            .build();

        let config = client.config();
        assert_eq!(config.addr(), "10.0.0.1:4000");
        assert_eq!(config.retry_limit, 2);
        assert_eq!(config.base_backoff, Duration::from_millis(50));
        assert_eq!(config.stall_timeout, None);
        assert_eq!(config.read_buffer_size, 512);
        assert_eq!(config.channel_capacity, 8);
    }

    #[test]
    fn test_builder_raises_zero_sizes() {
        let client = Client::builder()
            .read_buffer_size(0)
            .channel_capacity(0)
            .build();
        assert_eq!(client.config().read_buffer_size, 1);
        assert_eq!(client.config().channel_capacity, 1);
    }

    #[tokio::test]
    async fn test_zero_channel_capacity_in_config_still_runs() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut req = [0u8; 2];
            socket.read_exact(&mut req).await.unwrap();
            socket.write_all(&Record::new("MSFT", 'B', 1, 2, 1).encode()).await.unwrap();
            let mut rest = Vec::new();
            let _ = socket.read_to_end(&mut rest).await;
        });

        let config = ClientConfig {
            host: "127.0.0.1".to_string(),
            port,
            channel_capacity: 0,
            ..ClientConfig::default()
        };
        let records = tokio::time::timeout(Duration::from_secs(5), Client::new(config).fetch())
            .await
            .unwrap()
            .unwrap();
        server.await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, 1);
    }

    #[tokio::test]
    async fn test_initial_connect_failure_returns_io_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut sink = VecSink::default();
        let result = Client::builder()
            .host("127.0.0.1")
            .port(port)
            .build()
            .run(&mut sink)
            .await;

        assert!(matches!(result, Err(FeedError::Io(_))));
        assert_eq!(sink.deliveries, 0);
    }
}
