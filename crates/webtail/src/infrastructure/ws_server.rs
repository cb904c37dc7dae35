//! TCP accept loop, request routing, and per-session task management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming connections from browsers.
//! 3. Routing each connection by its request line: the landing page at `/`,
//!    the WebSocket upgrade at `/ws`, errors for everything else.
//! 4. Resolving the requested source *before* upgrading, so a bad request
//!    is rejected with a plain HTTP status and no session is created.
//! 5. Handing each upgraded connection and its opened source to a
//!    [`TailSession`].
//! 6. Stopping cleanly when the shared `running` flag is cleared.
//!
//! Each connection runs in its own Tokio task; the accept loop never waits
//! on a session, so one slow client cannot block others. Sessions share no
//! mutable state with each other — two viewers of the same file each get
//! their own source handle and cursor.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, error, info, warn};

use crate::application::{render_home, select_source};
use crate::domain::ServerConfig;
use crate::infrastructure::http;
use crate::infrastructure::tail_session::TailSession;

/// A bound listener ready to serve.
///
/// Binding is separated from serving so callers (and tests) can bind port 0
/// and learn the real address before the accept loop starts.
pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listener for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (port in use,
    /// missing permission to bind).
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("failed to bind listener on {}", config.bind_addr))?;
        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    /// The address actually bound (resolves port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the OS cannot report the local address.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("failed to read listener address")
    }

    /// Runs the accept loop until `running` is cleared.
    ///
    /// A short timeout on `accept()` lets the loop re-check the flag even
    /// when no connections arrive. Live sessions are not drained on
    /// shutdown; the process exit closes their connections and handles.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok`; accept errors are transient (e.g.
    /// file-descriptor exhaustion) and are logged rather than fatal.
    pub async fn run(self, running: Arc<AtomicBool>) -> anyhow::Result<()> {
        info!("listening on {}", self.local_addr()?);

        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping accept loop");
                break;
            }

            match timeout(Duration::from_millis(200), self.listener.accept()).await {
                Ok(Ok((stream, peer_addr))) => {
                    debug!("connection from {peer_addr}");
                    let config = Arc::clone(&self.config);
                    tokio::spawn(async move {
                        handle_connection(stream, peer_addr, config).await;
                    });
                }
                Ok(Err(e)) => {
                    error!("accept error: {e}");
                }
                Err(_) => {
                    // No connection within the timeout; re-check the flag.
                }
            }
        }

        Ok(())
    }
}

// ── Per-connection handling ───────────────────────────────────────────────────

/// Outer handler: logs the outcome of a connection so the inner routing can
/// use `?` freely.
async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, config: Arc<ServerConfig>) {
    match route_connection(stream, peer_addr, config).await {
        Ok(()) => debug!("connection {peer_addr} done"),
        Err(e) => warn!("connection {peer_addr} failed: {e:#}"),
    }
}

/// Routes one connection by its peeked request line.
async fn route_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<ServerConfig>,
) -> anyhow::Result<()> {
    let head = http::peek_request_head(&stream).await?;

    if head.method != "GET" {
        http::consume_request_head(&mut stream).await?;
        return http::write_error(&mut stream, 405, "Method Not Allowed", "GET only\n").await;
    }

    match head.path.as_str() {
        "/" => {
            http::consume_request_head(&mut stream).await?;
            let body = render_home(&config.mode);
            http::write_html(&mut stream, &body).await
        }
        "/ws" => serve_ws(stream, peer_addr, head.query.as_deref(), config).await,
        _ => {
            http::consume_request_head(&mut stream).await?;
            http::write_error(&mut stream, 404, "Not Found", "Not found\n").await
        }
    }
}

/// Resolves the source, upgrades the connection, and runs the session.
///
/// Selection failures never reach the session loops: the request is
/// rejected with the mapped HTTP status and the connection closes.
async fn serve_ws(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    query: Option<&str>,
    config: Arc<ServerConfig>,
) -> anyhow::Result<()> {
    let requested = http::query_param(query, "file");

    let source = match select_source(&config.mode, requested.as_deref()) {
        Ok(source) => source,
        Err(e) => {
            warn!("rejecting {peer_addr}: {e}");
            http::consume_request_head(&mut stream).await?;
            return http::write_error(&mut stream, e.http_status(), e.status_reason(), &format!("{e}\n"))
                .await;
        }
    };

    // Cap inbound message size at the framing layer; the session treats the
    // resulting capacity errors as dropped frames.
    let mut ws_config = WebSocketConfig::default();
    ws_config.max_message_size = Some(config.max_inbound_frame);

    let ws = tokio_tungstenite::accept_async_with_config(stream, Some(ws_config))
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    let session = TailSession::new(config.timing.clone());
    debug!(session = %session.id(), "session assigned to {peer_addr}");
    session.run(ws, source).await;
    Ok(())
}
