//! Client configuration.
//!
//! Defaults match the reference feed server: `localhost:3000`, five
//! reconnect attempts, linear backoff in steps of one second.

use std::time::Duration;

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default number of reconnect attempts.
pub const DEFAULT_RETRY_LIMIT: u32 = 5;

/// Default backoff step; attempt `n` waits `n` times this.
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(1000);

/// Default bound on how long a partial record may sit in the buffer.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Default socket read buffer size.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Default capacity of the transport event and writer channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Full client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Reconnect attempts allowed after the first connection closes.
    pub retry_limit: u32,
    /// Backoff step; see [`ClientConfig::backoff_for`].
    pub base_backoff: Duration,
    /// `None` waits forever on a partial record.
    pub stall_timeout: Option<Duration>,
    /// Socket read buffer size.
    pub read_buffer_size: usize,
    /// Capacity of the transport event and writer channels.
    pub channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            retry_limit: DEFAULT_RETRY_LIMIT,
            base_backoff: DEFAULT_BASE_BACKOFF,
            stall_timeout: Some(DEFAULT_STALL_TIMEOUT),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Load from environment with defaults.
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any `SEQFEED_*` key source, e.g. a map in tests.
    ///
    /// `SEQFEED_STALL_TIMEOUT_MS=0` disables the stall timeout.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("SEQFEED_HOST") {
            config.host = v;
        }
        if let Some(v) = lookup("SEQFEED_PORT") {
            config.port = v.parse().unwrap_or(config.port);
        }
        if let Some(v) = lookup("SEQFEED_RETRY_LIMIT") {
            config.retry_limit = v.parse().unwrap_or(config.retry_limit);
        }
        if let Some(v) = lookup("SEQFEED_BACKOFF_MS") {
            if let Ok(ms) = v.parse() {
                config.base_backoff = Duration::from_millis(ms);
            }
        }
        if let Some(v) = lookup("SEQFEED_STALL_TIMEOUT_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                config.stall_timeout = (ms > 0).then(|| Duration::from_millis(ms));
            }
        }

        config
    }

    /// `host:port` string for connecting.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff * attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 3000);
        assert_eq!(config.retry_limit, 5);
        assert_eq!(config.base_backoff, Duration::from_secs(1));
        assert_eq!(config.addr(), "localhost:3000");
    }

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_from_lookup_reads_every_key() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SEQFEED_HOST", "feed.internal"),
            ("SEQFEED_PORT", "4100"),
            ("SEQFEED_RETRY_LIMIT", "2"),
            ("SEQFEED_BACKOFF_MS", "250"),
            ("SEQFEED_STALL_TIMEOUT_MS", "1500"),
        ]));

        assert_eq!(config.addr(), "feed.internal:4100");
        assert_eq!(config.retry_limit, 2);
        assert_eq!(config.base_backoff, Duration::from_millis(250));
        assert_eq!(config.stall_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_from_lookup_zero_stall_timeout_disables_it() {
        let config = ClientConfig::from_lookup(lookup(&[("SEQFEED_STALL_TIMEOUT_MS", "0")]));
        assert_eq!(config.stall_timeout, None);
    }

    #[test]
    fn test_from_lookup_bad_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("SEQFEED_PORT", "not-a-port"),
            ("SEQFEED_RETRY_LIMIT", "-1"),
            ("SEQFEED_BACKOFF_MS", "soon"),
            ("SEQFEED_STALL_TIMEOUT_MS", ""),
        ]));

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.retry_limit, DEFAULT_RETRY_LIMIT);
        assert_eq!(config.base_backoff, DEFAULT_BASE_BACKOFF);
        assert_eq!(config.stall_timeout, Some(DEFAULT_STALL_TIMEOUT));
    }

    #[test]
    fn test_linear_backoff() {
        let config = ClientConfig::default();
        assert_eq!(config.backoff_for(1), Duration::from_secs(1));
        assert_eq!(config.backoff_for(3), Duration::from_secs(3));
        assert_eq!(config.backoff_for(5), Duration::from_secs(5));
    }
}
