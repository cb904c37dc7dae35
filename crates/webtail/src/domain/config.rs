//! Server configuration types.
//!
//! [`ServerConfig`] is the single source of truth for all runtime settings.
//! Build it once at startup (from CLI arguments, optionally merged with a
//! settings file) and wrap it in an `Arc` so every session task shares it
//! cheaply.

use std::net::SocketAddr;
use std::path::PathBuf;

use webtail_core::TailTiming;

/// Which sources this server exposes, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailMode {
    /// Multi-file mode: the listed files are selectable on the landing page
    /// and each connection picks one with the `file` query parameter.
    /// Paths are made absolute at startup so page values and query values
    /// compare exactly.
    Select(Vec<PathBuf>),

    /// Single-target mode: every connection tails this one file, re-sent
    /// wholesale whenever it changes. The query parameter is ignored.
    Single(PathBuf),

    /// Standard-input mode: every connection drains the process's stdin.
    Stdin,
}

impl TailMode {
    /// Short label for startup logging.
    pub fn describe(&self) -> String {
        match self {
            Self::Select(files) => format!("{} selectable file(s)", files.len()),
            Self::Single(path) => format!("single file {}", path.display()),
            Self::Stdin => "standard input".to_string(),
        }
    }
}

/// All runtime configuration for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address and port the listener binds to.
    pub bind_addr: SocketAddr,

    /// Which sources are exposed.
    pub mode: TailMode,

    /// Per-session timer settings (write deadline, liveness timeout, poll
    /// interval; the heartbeat period is derived from the liveness timeout).
    pub timing: TailTiming,

    /// Largest inbound WebSocket message accepted from a peer, in bytes.
    /// The protocol is one-directional for data, so peers have no reason to
    /// send anything sizable; larger frames are dropped.
    pub max_inbound_frame: usize,
}

impl Default for ServerConfig {
    /// Defaults suitable for local development: listen on all interfaces,
    /// tail standard input.
    fn default() -> Self {
        Self {
            // Compile-time-known valid socket address string.
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            mode: TailMode::Stdin,
            timing: TailTiming::default(),
            max_inbound_frame: 512,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
