//! `seqfeed` - fetch a complete sequenced feed and write it as JSON.
//!
//! Usage:
//!   seqfeed --host localhost --port 3000 --output output.json
//!
//! Environment:
//!   SEQFEED_HOST, SEQFEED_PORT, SEQFEED_RETRY_LIMIT, SEQFEED_BACKOFF_MS,
//!   SEQFEED_STALL_TIMEOUT_MS, SEQFEED_OUTPUT
//!   RUST_LOG controls log verbosity (default: info)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use seqfeed_client::{Client, ClientConfig, JsonFileSink};

/// Flags override the `SEQFEED_*` environment, which overrides the defaults.
#[derive(Parser, Debug)]
#[command(name = "seqfeed")]
#[command(about = "Fetch a sequenced record feed, filling gaps, and write it as JSON")]
struct Args {
    /// Server host [default: localhost]
    #[arg(long)]
    host: Option<String>,

    /// Server port [default: 3000]
    #[arg(long)]
    port: Option<u16>,

    /// Reconnect attempts while records are missing [default: 5]
    #[arg(long)]
    retry_limit: Option<u32>,

    /// Backoff step in milliseconds; attempt n waits n times this [default: 1000]
    #[arg(long)]
    backoff_ms: Option<u64>,

    /// Partial-record stall timeout in milliseconds, 0 waits forever [default: 10000]
    #[arg(long)]
    stall_timeout_ms: Option<u64>,

    /// Output file
    #[arg(short, long, env = "SEQFEED_OUTPUT", default_value = "output.json")]
    output: PathBuf,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        self.apply(ClientConfig::from_env())
    }

    /// Overlay the flags that were given onto `config`.
    fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(limit) = self.retry_limit {
            config.retry_limit = limit;
        }
        if let Some(ms) = self.backoff_ms {
            config.base_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = self.stall_timeout_ms {
            config.stall_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.client_config();

    let addr = config.addr();
    info!("Connecting to {}", addr);
    let mut sink = JsonFileSink::new(&args.output);
    Client::new(config)
        .run(&mut sink)
        .await
        .with_context(|| format!("feed from {} did not complete", addr))?;

    info!("Wrote {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_config() -> ClientConfig {
        ClientConfig {
            host: "from-env".to_string(),
            port: 4100,
            retry_limit: 2,
            base_backoff: Duration::from_millis(250),
            stall_timeout: Some(Duration::from_secs(3)),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_no_flags_keep_env_values() {
        let args = Args::try_parse_from(["seqfeed"]).unwrap();
        let config = args.apply(env_config());

        assert_eq!(config.addr(), "from-env:4100");
        assert_eq!(config.retry_limit, 2);
        assert_eq!(config.base_backoff, Duration::from_millis(250));
        assert_eq!(config.stall_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_flags_override_env_values() {
        let args = Args::try_parse_from([
            "seqfeed",
            "--host",
            "127.0.0.1",
            "--port",
            "5000",
            "--retry-limit",
            "7",
            "--backoff-ms",
            "10",
            "--stall-timeout-ms",
            "20",
        ])
        .unwrap();
        let config = args.apply(env_config());

        assert_eq!(config.addr(), "127.0.0.1:5000");
        assert_eq!(config.retry_limit, 7);
        assert_eq!(config.base_backoff, Duration::from_millis(10));
        assert_eq!(config.stall_timeout, Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_zero_stall_timeout_flag_disables_it() {
        let args = Args::try_parse_from(["seqfeed", "--stall-timeout-ms", "0"]).unwrap();
        assert_eq!(args.apply(env_config()).stall_timeout, None);
    }
}
