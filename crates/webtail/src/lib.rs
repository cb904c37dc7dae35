//! webtail library crate.
//!
//! Serves the live, growing content of text sources (files being appended
//! to, or standard input) to browsers over persistent WebSocket
//! connections, the way a continuous `tail -f` would.
//!
//! # Architecture
//!
//! ```text
//! Browser (text frames over WebSocket)
//!         ↕
//! [webtail]
//!   ├── domain/           Pure types: ServerConfig, TailMode
//!   ├── application/      Source selection, landing-page rendering
//!   └── infrastructure/
//!         ├── http/          Minimal request routing + static responses
//!         ├── ws_server/     TCP accept loop, WebSocket upgrade
//!         ├── tail_session/  The per-connection outbound/inbound loops
//!         └── settings/      Optional TOML settings file
//!         ↕
//! webtail-core  (SourceReader variants, ErrorDedup, TailTiming)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain` and `webtail-core` only.
//! - `infrastructure` depends on all other layers plus `tokio` and
//!   `tungstenite`.

/// Domain layer: pure configuration types (no I/O).
pub mod domain;

/// Application layer: source selection and page rendering.
pub mod application;

/// Infrastructure layer: accept loop, HTTP routing, tail sessions, settings.
pub mod infrastructure;
