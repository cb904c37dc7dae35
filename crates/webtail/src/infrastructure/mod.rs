//! Infrastructure layer for webtail.
//!
//! Everything that touches a socket or the filesystem on behalf of the
//! server lives here:
//!
//! - Binding the TCP listener and accepting connections
//! - Routing each connection by its HTTP request line (page vs. upgrade)
//! - Performing the WebSocket upgrade handshake
//! - Running the per-session outbound/inbound loops
//! - Loading the optional TOML settings file
//!
//! # What does NOT belong here?
//!
//! - Source selection rules and page rendering (application layer)
//! - Configuration types (domain layer)
//! - Source reading itself (`webtail-core`)

pub mod http;
pub mod settings;
pub mod tail_session;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use settings::{load_settings, Settings};
pub use ws_server::Server;
