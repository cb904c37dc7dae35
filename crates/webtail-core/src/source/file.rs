//! Incremental file tailing with a persistent read cursor.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::source::error::SourceError;

/// An open file handle whose read cursor only ever advances.
///
/// The cursor starts at the beginning of the file as it exists when the
/// source is opened, so the first polls stream the existing content and
/// later polls pick up appended bytes. The cursor is never rewound during
/// the session's lifetime; truncation or rotation of the underlying file is
/// out of scope.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    reader: BufReader<File>,
}

impl FileSource {
    /// Opens `path` for incremental tailing.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] or [`SourceError::PermissionDenied`]
    /// when the file cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        let file = File::open(&path).map_err(|e| SourceError::from_io(&path, e))?;
        Ok(Self {
            reader: BufReader::new(file),
            path,
        })
    }

    /// Path this source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads bytes newly available since the previous poll.
    ///
    /// Reads up to and including the next line terminator. At end-of-file
    /// the bytes read so far are returned immediately, so a partial line
    /// (a prompt, an unfinished progress line) is forwarded without waiting
    /// for its terminator; an empty buffer means nothing new was appended.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the underlying read fails. The cursor
    /// does not advance past bytes that were never returned.
    pub fn poll_increment(&mut self) -> Result<Vec<u8>, SourceError> {
        let mut buf = Vec::new();
        self.reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| SourceError::from_io(&self.path, e))?;
        Ok(buf)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
