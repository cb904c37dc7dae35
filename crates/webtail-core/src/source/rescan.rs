//! Whole-file rescan for the single-target mode.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::source::error::SourceError;

/// Re-reads a file from start to end whenever it changes.
///
/// Used when a small file is rewritten in place rather than appended to; the
/// trade is efficiency for simplicity, so there is no cursor to maintain.
/// Polls are gated on the file's modification time: an unchanged file yields
/// an empty result, a changed one yields the full current content. The first
/// poll after opening always yields the content.
///
/// Because every poll resolves the path from scratch, this variant notices a
/// deleted file (the poll fails) and recovers when the file is recreated
/// (the next poll succeeds with the new content).
#[derive(Debug)]
pub struct RescanSource {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl RescanSource {
    /// Validates that `path` is readable and prepares it for polling.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] or [`SourceError::PermissionDenied`]
    /// when the file cannot be inspected at open time.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let path = path.into();
        fs::metadata(&path).map_err(|e| SourceError::from_io(&path, e))?;
        Ok(Self {
            path,
            last_modified: None,
        })
    }

    /// Path this source watches.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the full file content if it changed since the last poll.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the file cannot be inspected or read,
    /// including when it has been deleted since the last poll.
    pub fn poll_increment(&mut self) -> Result<Vec<u8>, SourceError> {
        let metadata = fs::metadata(&self.path).map_err(|e| SourceError::from_io(&self.path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| SourceError::from_io(&self.path, e))?;

        if self.last_modified == Some(modified) {
            return Ok(Vec::new());
        }

        let content = fs::read(&self.path).map_err(|e| SourceError::from_io(&self.path, e))?;
        debug!(path = %self.path.display(), bytes = content.len(), "rescanned changed file");
        self.last_modified = Some(modified);
        Ok(content)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_first_poll_returns_full_content() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "status: ok\n").unwrap();
        tmp.flush().unwrap();

        let mut source = RescanSource::open(tmp.path()).unwrap();
        assert_eq!(source.poll_increment().unwrap(), b"status: ok\n");
    }

    #[test]
    fn test_unchanged_file_polls_empty() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "status: ok\n").unwrap();
        tmp.flush().unwrap();

        let mut source = RescanSource::open(tmp.path()).unwrap();
        assert!(!source.poll_increment().unwrap().is_empty());

        // Same mtime → silent polls.
        assert_eq!(source.poll_increment().unwrap(), b"");
        assert_eq!(source.poll_increment().unwrap(), b"");
    }

    #[test]
    fn test_rewritten_file_returns_new_full_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.txt");
        fs::write(&path, "first\n").unwrap();

        let mut source = RescanSource::open(&path).unwrap();
        assert_eq!(source.poll_increment().unwrap(), b"first\n");

        // Rewrite in place; mtime moves forward, poll yields the whole file.
        fs::write(&path, "second version\n").unwrap();
        assert_eq!(source.poll_increment().unwrap(), b"second version\n");
    }

    #[test]
    fn test_deleted_file_polls_not_found_then_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.txt");
        fs::write(&path, "alive\n").unwrap();

        let mut source = RescanSource::open(&path).unwrap();
        assert_eq!(source.poll_increment().unwrap(), b"alive\n");

        fs::remove_file(&path).unwrap();
        assert!(matches!(
            source.poll_increment(),
            Err(SourceError::NotFound { .. })
        ));

        // Recreated file has a fresh mtime, so the next poll succeeds and
        // returns the new content.
        fs::write(&path, "back again\n").unwrap();
        assert_eq!(source.poll_increment().unwrap(), b"back again\n");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let result = RescanSource::open("/nonexistent/webtail/status.txt");
        assert!(matches!(result, Err(SourceError::NotFound { .. })));
    }
}
