//! Application layer for webtail.
//!
//! Orchestrates the business logic without doing any I/O of its own beyond
//! opening the selected source:
//!
//! - Resolving a connection's `file` query parameter against the configured
//!   [`TailMode`](crate::domain::TailMode) into an opened source reader.
//! - Rendering the landing page for the configured mode.
//!
//! Socket handling, WebSocket framing, and task spawning all live in the
//! infrastructure layer.

pub mod page;
pub mod select;

pub use page::render_home;
pub use select::{select_source, SelectError};
