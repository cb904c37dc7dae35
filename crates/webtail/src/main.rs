//! webtail — entry point.
//!
//! Serves the live tail of text sources to browsers: point it at one or
//! more files (or pipe something into it) and open the printed address.
//!
//! # Usage
//!
//! ```text
//! webtail [OPTIONS] [FILES]...
//!
//! tail -f style, selectable on the page:
//!   webtail /var/log/syslog /var/log/nginx/access.log
//!
//! one small file, re-sent whenever it changes:
//!   webtail --single /var/run/build-status.txt
//!
//! standard input:
//!   make 2>&1 | webtail
//! ```
//!
//! # Environment variable overrides
//!
//! Every flag can also come from an environment variable. Flags take
//! precedence over variables, and both take precedence over the settings
//! file named by `--config`.
//!
//! | Variable                     | Default   | Description                     |
//! |------------------------------|-----------|---------------------------------|
//! | `WEBTAIL_BIND`               | `0.0.0.0` | Listen address                  |
//! | `WEBTAIL_PORT`               | `8080`    | Listen port                     |
//! | `WEBTAIL_POLL_INTERVAL_MS`   | `100`     | Source poll interval (ms)       |
//! | `WEBTAIL_PONG_TIMEOUT_SECS`  | `60`      | Peer liveness timeout (secs)    |
//! | `WEBTAIL_WRITE_TIMEOUT_SECS` | `10`      | Frame write deadline (secs)     |
//! | `WEBTAIL_MAX_INBOUND_FRAME`  | `512`     | Inbound message cap (bytes)     |
//! | `WEBTAIL_CONFIG`             | —         | Settings file path              |

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use webtail::domain::{ServerConfig, TailMode};
use webtail::infrastructure::{load_settings, Server, Settings};
use webtail_core::TailTiming;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Streams the growing tail of files or standard input to browsers over
/// WebSocket.
#[derive(Debug, Parser)]
#[command(
    name = "webtail",
    about = "Live-tail files or stdin to the browser",
    version
)]
struct Cli {
    /// Files offered for tailing. With no files, standard input is tailed.
    files: Vec<PathBuf>,

    /// Treat the single FILE as a small status file: re-send its whole
    /// content whenever it changes instead of tailing appends.
    #[arg(long)]
    single: bool,

    /// IP address to bind the listener to.
    #[arg(long, env = "WEBTAIL_BIND")]
    bind: Option<String>,

    /// TCP port to listen on.
    #[arg(long, env = "WEBTAIL_PORT")]
    port: Option<u16>,

    /// Source poll interval in milliseconds.
    #[arg(long, env = "WEBTAIL_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Peer liveness timeout in seconds. Pings go out at 45 % of this.
    #[arg(long, env = "WEBTAIL_PONG_TIMEOUT_SECS")]
    pong_timeout_secs: Option<u64>,

    /// Frame write deadline in seconds.
    #[arg(long, env = "WEBTAIL_WRITE_TIMEOUT_SECS")]
    write_timeout_secs: Option<u64>,

    /// Largest accepted inbound WebSocket message in bytes.
    #[arg(long, env = "WEBTAIL_MAX_INBOUND_FRAME")]
    max_inbound_frame: Option<usize>,

    /// Optional TOML settings file (overridden by any explicit flag).
    #[arg(long, env = "WEBTAIL_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Merges CLI arguments with `settings` into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error for an unparseable bind address, a `--single` flag
    /// without exactly one file, or timing values that fail validation.
    fn into_server_config(self, settings: Settings) -> anyhow::Result<ServerConfig> {
        let mode = if self.single {
            match self.files.as_slice() {
                [one] => TailMode::Single(absolute(one)?),
                _ => anyhow::bail!("--single requires exactly one FILE"),
            }
        } else if self.files.is_empty() {
            TailMode::Stdin
        } else {
            let files = self
                .files
                .iter()
                .map(|p| absolute(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            TailMode::Select(files)
        };

        let bind = self.bind.unwrap_or(settings.network.bind);
        let port = self.port.unwrap_or(settings.network.port);
        let bind_addr: SocketAddr = format!("{bind}:{port}")
            .parse()
            .with_context(|| format!("invalid bind address: '{bind}:{port}'"))?;

        let timing = TailTiming {
            write_wait: Duration::from_secs(
                self.write_timeout_secs
                    .unwrap_or(settings.timing.write_wait_secs),
            ),
            pong_wait: Duration::from_secs(
                self.pong_timeout_secs
                    .unwrap_or(settings.timing.pong_wait_secs),
            ),
            poll_period: Duration::from_millis(
                self.poll_interval_ms
                    .unwrap_or(settings.timing.poll_interval_ms),
            ),
        };
        timing.validate().context("invalid timing configuration")?;

        Ok(ServerConfig {
            bind_addr,
            mode,
            timing,
            max_inbound_frame: self
                .max_inbound_frame
                .unwrap_or(settings.limits.max_inbound_frame),
        })
    }
}

/// Makes `path` absolute against the current directory without requiring it
/// to exist yet; a log file may well appear after startup.
fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().context("cannot resolve current directory")?;
        Ok(cwd.join(path))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log level comes from RUST_LOG, falling back to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let settings = match cli.config.as_deref() {
        Some(path) => load_settings(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    let config = cli.into_server_config(settings)?;
    info!(
        "webtail starting — {} on {}",
        config.mode.describe(),
        config.bind_addr
    );

    // Ctrl+C clears the flag; the accept loop checks it every 200 ms.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    let server = Server::bind(config).await?;
    server.run(running).await?;

    info!("webtail stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
