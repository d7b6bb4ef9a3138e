//! Session state machine.
//!
//! All mutable session data lives here: the record tracker, the byte
//! accumulator, the retry counter and the resend snapshot carried across a
//! reconnect. The machine performs no I/O. The connection manager feeds it
//! [`SessionEvent`]s one at a time and executes the [`Action`]s it returns.
//!
//! ```text
//!                 Start
//!  Disconnected ─────────▶ Connecting ──Connected──▶ Connected ──Data──▶ Receiving
//!        ▲                     ▲                         │                   │
//!        │                     │ BackoffElapsed          │ Closed            │ Closed
//!        │                  Backoff ◀──(gap, retries left)──────────────────┘
//!        │                                               │
//!        └── Closed ─┬─ nothing missing ─────▶ Completed
//!                    └─ retries exhausted ───▶ Failed
//! ```
//!
//! Transport errors never decide anything themselves: they ask for the
//! transport to be closed and the close event runs the retry decision.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use crate::completion::{self, Completion};
use crate::config::ClientConfig;
use crate::error::FeedError;
use crate::protocol::{Record, RecordBuffer, Request};
use crate::resend::ResendPlan;
use crate::tracker::SequenceTracker;

/// Connection/session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport; initial state.
    Disconnected,
    /// Connect in progress.
    Connecting,
    /// Transport open, initial requests sent.
    Connected,
    /// At least one chunk received on this transport.
    Receiving,
    /// Transport closed with gaps; waiting out the backoff delay.
    Backoff,
    /// All records delivered.
    Completed,
    /// Retry budget spent or initial connect failed.
    Failed,
}

impl SessionState {
    /// True for `Completed` and `Failed`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Connected => write!(f, "CONNECTED"),
            Self::Receiving => write!(f, "RECEIVING"),
            Self::Backoff => write!(f, "BACKOFF"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Inputs to the state machine.
#[derive(Debug)]
pub enum SessionEvent {
    /// Begin the session.
    Start,
    /// Transport connected.
    Connected,
    /// Connect attempt failed.
    ConnectFailed(std::io::Error),
    /// Bytes read from the transport.
    Data(Bytes),
    /// Socket-level error (or stalled partial frame).
    TransportError(FeedError),
    /// Transport closed, for any reason.
    Closed,
    /// Backoff delay has run out.
    BackoffElapsed,
}

/// Side effects requested by the state machine.
#[derive(Debug)]
pub enum Action {
    /// Open a new transport.
    Connect,
    /// Write a request frame on the active transport.
    Send(Request),
    /// Close the active transport; the manager reports `Closed` afterwards.
    Close,
    /// Wait, then report `BackoffElapsed`.
    Sleep(Duration),
    /// Hand the final ordered records to the output collaborator.
    Deliver(Vec<Record>),
    /// Terminal failure.
    Fail(FeedError),
}

/// One logical feed session.
pub struct Session {
    state: SessionState,
    tracker: SequenceTracker,
    buffer: RecordBuffer,
    retries: u32,
    config: ClientConfig,
    has_connected: bool,
    /// Resend round to replay after reconnecting; snapshot from close time.
    pending_resend: ResendPlan,
}

impl Session {
    /// Create a session from client configuration.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            state: SessionState::Disconnected,
            tracker: SequenceTracker::new(),
            buffer: RecordBuffer::with_capacity(config.read_buffer_size),
            retries: 0,
            config: config.clone(),
            has_connected: false,
            pending_resend: ResendPlan::default(),
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Reconnect attempts made so far.
    #[inline]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Read access to the received records.
    pub fn tracker(&self) -> &SequenceTracker {
        &self.tracker
    }

    /// True while a partial record is buffered.
    pub fn has_partial_frame(&self) -> bool {
        self.buffer.has_partial()
    }

    /// Bytes currently held in the accumulator.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Apply one event and return the actions it produces.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Action> {
        use SessionEvent as E;
        use SessionState as S;

        match (self.state, event) {
            (S::Completed | S::Failed, event) => {
                tracing::trace!(state = %self.state, ?event, "event after terminal state");
                Vec::new()
            }

            (S::Disconnected, E::Start) => {
                self.state = S::Connecting;
                vec![Action::Connect]
            }

            (S::Connecting, E::Connected) => self.on_connected(),

            (S::Connecting, E::ConnectFailed(err)) => {
                if self.has_connected {
                    tracing::error!("Reconnect failed: {}", err);
                    self.on_closed()
                } else {
                    tracing::error!("Connect failed: {}", err);
                    self.state = S::Failed;
                    vec![Action::Fail(FeedError::Io(err))]
                }
            }

            (S::Connected | S::Receiving, E::Data(chunk)) => {
                self.state = S::Receiving;
                self.on_data(&chunk)
            }

            (S::Connected | S::Receiving, E::TransportError(err)) => {
                tracing::error!("Error: {}", err);
                vec![Action::Close]
            }

            (S::Connected | S::Receiving, E::Closed) => self.on_closed(),

            (S::Backoff, E::BackoffElapsed) => {
                self.state = S::Connecting;
                vec![Action::Connect]
            }

            (state, event) => {
                tracing::warn!(%state, ?event, "ignoring event");
                Vec::new()
            }
        }
    }

    fn on_connected(&mut self) -> Vec<Action> {
        self.state = SessionState::Connected;
        // A partial record from a dead transport can never be completed.
        self.buffer.clear();

        if !self.has_connected {
            self.has_connected = true;
            tracing::info!("Connected to server");
            return vec![Action::Send(Request::StreamAll)];
        }

        tracing::info!(
            attempt = self.retries,
            requests = self.pending_resend.requests.len(),
            "Reconnected to server"
        );
        std::mem::take(&mut self.pending_resend)
            .requests
            .into_iter()
            .map(Action::Send)
            .collect()
    }

    fn on_data(&mut self, chunk: &[u8]) -> Vec<Action> {
        let decoded = self.buffer.push(chunk);
        for record in decoded.records {
            tracing::debug!(sequence = record.sequence, symbol = %record.symbol, "received record");
            self.tracker.insert(record);
        }

        if !decoded.quiescent {
            return Vec::new();
        }

        match completion::evaluate(&self.tracker) {
            Completion::Complete(records) => {
                self.state = SessionState::Completed;
                tracing::info!(records = records.len(), "all records received");
                vec![Action::Deliver(records), Action::Close]
            }
            Completion::Incomplete { plan, .. } => {
                plan.requests.into_iter().map(Action::Send).collect()
            }
        }
    }

    fn on_closed(&mut self) -> Vec<Action> {
        tracing::info!("Connection closed");
        let missing = self.tracker.missing();

        if missing.is_empty() {
            self.state = SessionState::Completed;
            let records = self.tracker.ordered_records();
            tracing::info!(records = records.len(), "All records received successfully");
            return vec![Action::Deliver(records)];
        }

        if self.retries >= self.config.retry_limit {
            self.state = SessionState::Failed;
            tracing::error!(attempts = self.retries, missing = ?missing, "Max retry attempts reached");
            return vec![Action::Fail(FeedError::RetriesExhausted {
                attempts: self.retries,
                missing,
            })];
        }

        self.retries += 1;
        self.state = SessionState::Backoff;
        let delay = self.config.backoff_for(self.retries);
        tracing::info!(
            attempt = self.retries,
            delay_ms = delay.as_millis() as u64,
            missing = ?missing,
            "Retrying missing record requests"
        );
        self.pending_resend = ResendPlan::from_snapshot(&missing);
        vec![Action::Sleep(delay)]
    }
}
