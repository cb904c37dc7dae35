//! # webtail-core
//!
//! Shared library for webtail containing the source readers, the source
//! error taxonomy, the error de-duplication gate, and the timing rules that
//! tie the heartbeat period to the liveness timeout.
//!
//! This crate is used by the `webtail` server binary. It has zero
//! dependencies on async runtimes, sockets, or WebSocket framing: everything
//! here is synchronous `std` I/O, so the polling behavior can be tested
//! against plain temp files without a network in sight.
//!
//! # What lives here
//!
//! - **`source`** – The closed set of byte-producing origins a session can
//!   tail: an incrementally-read file, a small file re-read wholesale when
//!   it changes, and standard input. All three expose the same two-method
//!   capability (`open`, `poll_increment`) so the session never knows which
//!   variant it holds.
//!
//! - **`dedup`** – The last-observed-error gate. When a source fails the
//!   same way on every poll tick, the peer must see the error text once,
//!   not once per tick.
//!
//! - **`timing`** – The session's timer constants. The heartbeat period is
//!   *derived* from the liveness timeout (45 % of it), never configured
//!   independently, so the safety margin stays auditable.

pub mod dedup;
pub mod source;
pub mod timing;

// Re-export the most-used types at the crate root so callers can write
// `webtail_core::SourceReader` instead of the longer module path.
pub use dedup::ErrorDedup;
pub use source::error::SourceError;
pub use source::{FileSource, RescanSource, SourceReader, SourceSpec, StdinSource};
pub use timing::{TailTiming, TimingError};
