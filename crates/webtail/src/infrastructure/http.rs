//! Minimal HTTP request routing over a raw TCP stream.
//!
//! The server speaks exactly enough HTTP to do its job: route `GET /` to
//! the landing page, `GET /ws` into the WebSocket handshake, and everything
//! else to an error response. The request head is *peeked*, not read —
//! tokio-tungstenite's `accept_async` performs the real upgrade handshake
//! and must see the request from its first byte, so routing may not consume
//! anything from the stream.

use std::time::Duration;

use anyhow::{bail, Context};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Upper bound on the bytes of request head examined for routing.
const MAX_HEAD_BYTES: usize = 2048;

/// How many short waits to tolerate while the request line trickles in.
const PEEK_ATTEMPTS: usize = 100;

/// The parsed first line of an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    /// Request method (`GET`, `POST`, ...).
    pub method: String,
    /// Path component of the request target, without the query.
    pub path: String,
    /// Raw query string after `?`, if any.
    pub query: Option<String>,
}

/// Peeks the request line off `stream` without consuming it.
///
/// Waits briefly for the line to arrive in full; browsers send the whole
/// request head in one segment, so the loop almost always finishes on the
/// first peek.
///
/// # Errors
///
/// Returns an error when the peer closes before sending a full request
/// line, when the line exceeds [`MAX_HEAD_BYTES`], or when it is not
/// parseable HTTP.
pub async fn peek_request_head(stream: &TcpStream) -> anyhow::Result<RequestHead> {
    let mut buf = [0u8; MAX_HEAD_BYTES];

    for _ in 0..PEEK_ATTEMPTS {
        let n = stream
            .peek(&mut buf)
            .await
            .context("failed to peek request head")?;

        if let Some(line_end) = find_line_end(&buf[..n]) {
            let line = std::str::from_utf8(&buf[..line_end])
                .context("request line is not valid UTF-8")?;
            return parse_request_line(line);
        }

        if n == 0 {
            bail!("peer closed before sending a request line");
        }
        if n == buf.len() {
            bail!("request line exceeds {MAX_HEAD_BYTES} bytes");
        }

        // Partial line so far; give the rest of the segment a moment.
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    bail!("request line did not arrive in time")
}

/// Consumes the request head (through the blank line) from `stream`.
///
/// Called before writing a plain HTTP response: leaving the request
/// unread makes some peers see a connection reset instead of the response.
///
/// # Errors
///
/// Returns an error when the head cannot be read or never terminates
/// within [`MAX_HEAD_BYTES`].
pub async fn consume_request_head(stream: &mut TcpStream) -> anyhow::Result<()> {
    let mut consumed: Vec<u8> = Vec::with_capacity(256);
    let mut byte = [0u8; 1];

    while consumed.len() < MAX_HEAD_BYTES {
        let n = stream
            .read(&mut byte)
            .await
            .context("failed to read request head")?;
        if n == 0 {
            // Peer closed mid-head; nothing left to consume.
            return Ok(());
        }
        consumed.push(byte[0]);
        if consumed.ends_with(b"\r\n\r\n") {
            return Ok(());
        }
    }
    bail!("request head exceeds {MAX_HEAD_BYTES} bytes")
}

/// Writes a `200 OK` HTML response and flushes it.
///
/// # Errors
///
/// Returns an error when the write fails.
pub async fn write_html(stream: &mut TcpStream, body: &str) -> anyhow::Result<()> {
    write_response(stream, 200, "OK", "text/html; charset=utf-8", body).await
}

/// Writes a plain-text error response and flushes it.
///
/// # Errors
///
/// Returns an error when the write fails.
pub async fn write_error(
    stream: &mut TcpStream,
    status: u16,
    reason: &str,
    body: &str,
) -> anyhow::Result<()> {
    write_response(stream, status, reason, "text/plain; charset=utf-8", body).await
}

async fn write_response(
    stream: &mut TcpStream,
    status: u16,
    reason: &str,
    content_type: &str,
    body: &str,
) -> anyhow::Result<()> {
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    );
    stream
        .write_all(response.as_bytes())
        .await
        .context("failed to write HTTP response")?;
    stream.flush().await.context("failed to flush HTTP response")
}

// ── Request-line parsing ──────────────────────────────────────────────────────

fn find_line_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn parse_request_line(line: &str) -> anyhow::Result<RequestHead> {
    let mut parts = line.split(' ');
    let method = parts.next().filter(|m| !m.is_empty());
    let target = parts.next();
    let version = parts.next();

    let (Some(method), Some(target), Some(_version)) = (method, target, version) else {
        bail!("malformed request line: {line:?}");
    };

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    };

    Ok(RequestHead {
        method: method.to_string(),
        path,
        query,
    })
}

/// Extracts and percent-decodes the value of `key` from a query string.
pub fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    let query = query?;
    for pair in query.split('&') {
        let (k, v) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        if k == key {
            return Some(percent_decode(v));
        }
    }
    None
}

/// Decodes `%XX` escapes and `+`-as-space, as browsers encode query values.
/// Malformed escapes pass through literally.
fn percent_decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => match hex_pair(bytes.get(i + 1).copied(), bytes.get(i + 2).copied()) {
                Some(decoded) => {
                    out.push(decoded);
                    i += 3;
                }
                None => {
                    out.push(b'%');
                    i += 1;
                }
            },
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: Option<u8>, lo: Option<u8>) -> Option<u8> {
    let hi = (hi? as char).to_digit(16)?;
    let lo = (lo? as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
