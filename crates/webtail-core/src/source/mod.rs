//! Byte-producing sources a tail session can follow.
//!
//! A session tails exactly one source for its whole lifetime. The source is
//! one of a closed set of variants behind a single capability:
//!
//! - [`FileSource`] – an open read handle with a persistent, forward-only
//!   cursor. Each poll returns only bytes appended since the previous poll.
//! - [`RescanSource`] – a path that is re-read from start to end whenever
//!   its modification time changes. Used in single-target mode where the
//!   watched file is small and rewritten rather than appended.
//! - [`StdinSource`] – the process's standard input, drained one buffered
//!   line per poll through a background reader thread.
//!
//! The variants are a plain enum rather than a trait object: the set is
//! closed, the session dispatches through [`SourceReader::poll_increment`],
//! and every variant stays nameable in tests.
//!
//! # The poll contract
//!
//! `poll_increment` returns an **empty buffer** when nothing new is
//! available. That is the expected steady state of an idle source, not a
//! failure, and the caller must not forward it to the peer. Errors are
//! reserved for reads that actually went wrong (file deleted, permission
//! revoked, I/O failure); they are non-fatal to the session, which keeps
//! polling so the source can recover.

pub mod error;
pub mod file;
pub mod rescan;
pub mod stdin;

use std::path::PathBuf;

pub use error::SourceError;
pub use file::FileSource;
pub use rescan::RescanSource;
pub use stdin::StdinSource;

// ── Source specification ──────────────────────────────────────────────────────

/// Names a byte-producing origin before it is opened.
///
/// A spec is what configuration and source selection produce; opening it
/// yields the live [`SourceReader`] with its handle and cursor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// Tail a file incrementally from its current beginning.
    File(PathBuf),
    /// Re-read a whole file whenever it changes.
    Rescan(PathBuf),
    /// Drain the process's standard input.
    Stdin,
}

// ── Source reader ─────────────────────────────────────────────────────────────

/// An opened source with its read state.
///
/// Exactly one session owns a reader; readers are never shared, even when
/// two sessions tail the same path (each gets its own handle and cursor).
#[derive(Debug)]
pub enum SourceReader {
    /// Incremental file tail.
    File(FileSource),
    /// Full-content rescan of a single file.
    Rescan(RescanSource),
    /// Standard input.
    Stdin(StdinSource),
}

impl SourceReader {
    /// Opens the source named by `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] or [`SourceError::PermissionDenied`]
    /// when a file source cannot be opened. A failure here means the session
    /// never starts; mid-session errors go through [`poll_increment`]
    /// instead.
    ///
    /// [`poll_increment`]: SourceReader::poll_increment
    pub fn open(spec: SourceSpec) -> Result<Self, SourceError> {
        match spec {
            SourceSpec::File(path) => FileSource::open(path).map(Self::File),
            SourceSpec::Rescan(path) => RescanSource::open(path).map(Self::Rescan),
            SourceSpec::Stdin => Ok(Self::Stdin(StdinSource::stdin())),
        }
    }

    /// Returns bytes that became available since the previous poll.
    ///
    /// An empty buffer means "nothing new" and is the normal idle result.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the underlying read fails. The error
    /// carries a stable display string so the caller can de-duplicate
    /// repeated identical failures across polls.
    pub fn poll_increment(&mut self) -> Result<Vec<u8>, SourceError> {
        match self {
            Self::File(source) => source.poll_increment(),
            Self::Rescan(source) => source.poll_increment(),
            Self::Stdin(source) => source.poll_increment(),
        }
    }

    /// Short human-readable label for log messages.
    pub fn describe(&self) -> String {
        match self {
            Self::File(source) => format!("file:{}", source.path().display()),
            Self::Rescan(source) => format!("rescan:{}", source.path().display()),
            Self::Stdin(_) => "stdin".to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
