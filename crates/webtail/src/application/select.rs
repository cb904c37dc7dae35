//! Source selection for an incoming connection.
//!
//! Selection happens before the WebSocket upgrade, so a failure here is a
//! plain HTTP rejection and no session is ever created; the loops only see
//! sources that opened successfully.

use thiserror::Error;

use webtail_core::{SourceError, SourceReader, SourceSpec};

use crate::domain::TailMode;

/// Why a connection's source request was refused.
#[derive(Debug, Error)]
pub enum SelectError {
    /// Multi-file mode requires a `file` query parameter.
    #[error("missing 'file' query parameter")]
    MissingParameter,

    /// The requested name is not one of the files exposed on the page.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// The source was legitimate but could not be opened.
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl SelectError {
    /// HTTP status code the rejection is surfaced with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingParameter => 400,
            Self::UnknownSource(_) => 404,
            Self::Source(SourceError::NotFound { .. }) => 404,
            Self::Source(SourceError::PermissionDenied { .. }) => 403,
            Self::Source(SourceError::Io { .. }) => 500,
        }
    }

    /// Reason phrase matching [`http_status`](Self::http_status).
    pub fn status_reason(&self) -> &'static str {
        match self.http_status() {
            400 => "Bad Request",
            403 => "Forbidden",
            404 => "Not Found",
            _ => "Internal Server Error",
        }
    }
}

/// Resolves `requested` (the decoded `file` query parameter, if any) against
/// the server's mode and opens the source.
///
/// In multi-file mode the request must name one of the configured paths
/// exactly; the page only ever offers those, so anything else is either a
/// typo or a probe. Single-file and stdin modes ignore the parameter; the
/// source was fixed at startup.
///
/// # Errors
///
/// Returns a [`SelectError`] when the parameter is missing or unknown, or
/// when the source fails to open.
pub fn select_source(mode: &TailMode, requested: Option<&str>) -> Result<SourceReader, SelectError> {
    match mode {
        TailMode::Select(files) => {
            let name = requested.ok_or(SelectError::MissingParameter)?;
            let path = files
                .iter()
                .find(|p| p.to_string_lossy() == name)
                .ok_or_else(|| SelectError::UnknownSource(name.to_string()))?;
            Ok(SourceReader::open(SourceSpec::File(path.clone()))?)
        }
        TailMode::Single(path) => Ok(SourceReader::open(SourceSpec::Rescan(path.clone()))?),
        TailMode::Stdin => Ok(SourceReader::open(SourceSpec::Stdin)?),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
