//! Optional TOML settings file.
//!
//! Everything the settings file can express also has a CLI flag; the file
//! exists so deployments can pin timing and limits without a wall of
//! arguments. Precedence is CLI flag over file over built-in default, which
//! `main` implements by treating unset flags as "ask the settings".
//!
//! Every field is defaulted, so a partial file works:
//!
//! ```toml
//! [network]
//! bind = "127.0.0.1"
//! port = 9000
//!
//! [timing]
//! poll_interval_ms = 50
//! pong_wait_secs = 30
//!
//! [limits]
//! max_inbound_frame = 1024
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A file system I/O error occurred. A missing file is an error too:
    /// the path was given explicitly on the command line.
    #[error("cannot read settings file {}: {}", .path.display(), .source)]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Settings schema ───────────────────────────────────────────────────────────

/// Top-level settings file contents.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default)]
    pub timing: TimingSettings,
    #[serde(default)]
    pub limits: LimitSettings,
}

/// Listen address settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NetworkSettings {
    /// IP address to bind. `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Session timer settings. The ping period is derived, never configured.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TimingSettings {
    /// Deadline for writing one frame, in seconds.
    #[serde(default = "default_write_wait_secs")]
    pub write_wait_secs: u64,
    /// Liveness timeout, in seconds.
    #[serde(default = "default_pong_wait_secs")]
    pub pong_wait_secs: u64,
    /// Source poll interval, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Inbound protocol limits.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LimitSettings {
    /// Largest accepted inbound WebSocket message, in bytes.
    #[serde(default = "default_max_inbound_frame")]
    pub max_inbound_frame: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_write_wait_secs() -> u64 {
    10
}
fn default_pong_wait_secs() -> u64 {
    60
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_max_inbound_frame() -> usize {
    512
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            write_wait_secs: default_write_wait_secs(),
            pong_wait_secs: default_pong_wait_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_inbound_frame: default_max_inbound_frame(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads settings from `path`.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] when the file cannot be read (including
/// when it does not exist) and [`SettingsError::Parse`] when the TOML is
/// malformed.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
