//! Last-observed-error de-duplication.
//!
//! A failing source fails on every poll tick, typically with the same error.
//! The peer should read the error text once per distinct failure, not once
//! per tick, so the session keeps the last observed error text and reports
//! only changes. A successful poll clears the state, which re-arms reporting
//! for a later recurrence of the same error.

use crate::source::error::SourceError;

/// Gate that lets each distinct run of identical errors through once.
///
/// The state is an explicit `Option<String>` of the last reported error text
/// rather than an ad hoc comparison inside the poll loop, so the reporting
/// rules can be tested in isolation from any I/O.
#[derive(Debug, Default)]
pub struct ErrorDedup {
    last: Option<String>,
}

impl ErrorDedup {
    /// Creates a gate with no error observed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed poll. Returns the error text if it should be
    /// reported to the peer, `None` if it repeats the last reported text.
    pub fn observe(&mut self, err: &SourceError) -> Option<String> {
        let text = err.to_string();
        if self.last.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.last = Some(text.clone());
        Some(text)
    }

    /// Records a successful poll, re-arming reporting.
    pub fn clear(&mut self) {
        self.last = None;
    }

    /// Whether the most recent poll observed an error.
    pub fn is_failing(&self) -> bool {
        self.last.is_some()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
