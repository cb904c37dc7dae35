//! Source error taxonomy.
//!
//! Open-time errors (`NotFound`, `PermissionDenied`) are fatal to session
//! initialization: the caller rejects the connection and no session is
//! created. Poll-time errors are non-fatal: the session reports the error
//! text to the peer once (see [`crate::dedup::ErrorDedup`]) and keeps
//! polling, so a transient condition (a file deleted and recreated, a
//! permission restored) recovers on its own.
//!
//! Display strings must stay stable for a given failure: the de-duplication
//! gate compares rendered text across polls, and an error that renders
//! differently every tick would flood the peer.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Everything that can go wrong opening or polling a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The named file does not exist (or disappeared mid-session).
    #[error("no such file: {}", .path.display())]
    NotFound {
        /// Path that failed to resolve.
        path: PathBuf,
    },

    /// The process may not read the named file.
    #[error("permission denied: {}", .path.display())]
    PermissionDenied {
        /// Path that was refused.
        path: PathBuf,
    },

    /// Any other I/O failure while reading.
    #[error("read failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    /// Classifies an `io::Error` raised while touching `path`.
    ///
    /// `NotFound` and `PermissionDenied` get their own variants because they
    /// map to distinct HTTP rejections at selection time; everything else is
    /// a generic read failure.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Self::Io { source },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
