//! End-to-end tests for the tail session over a real WebSocket connection.
//!
//! Each test binds a server on an ephemeral port, connects with a real
//! `tokio-tungstenite` client, and observes the wire:
//!
//! - Incremental tailing: known appends arrive as exactly the appended
//!   bytes, in order, with idle polls producing nothing.
//! - Single-file mode: full content on change, one error message for a
//!   deleted file, automatic recovery after recreation.
//! - Liveness: a client that never answers pings is disconnected within
//!   the liveness window.
//! - The plain HTTP surface: landing page and rejected source requests.
//!
//! Timings are scaled down from the defaults so the suite runs in seconds;
//! the derivation (ping period = 45 % of the liveness timeout) holds at any
//! scale.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use webtail::domain::{ServerConfig, TailMode};
use webtail::infrastructure::Server;
use webtail_core::TailTiming;

// ── Harness helpers ───────────────────────────────────────────────────────────

/// Fast timings for tests: 20 ms polls, 10 s liveness (pings stay out of
/// the way unless a test wants them).
fn fast_timing() -> TailTiming {
    TailTiming {
        write_wait: Duration::from_secs(5),
        pong_wait: Duration::from_secs(10),
        poll_period: Duration::from_millis(20),
    }
}

/// Binds a server for `mode` on an ephemeral loopback port and starts its
/// accept loop. The returned address is ready to connect to.
async fn start_server(mode: TailMode, timing: TailTiming) -> SocketAddr {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        mode,
        timing,
        max_inbound_frame: 512,
    };
    let server = Server::bind(config).await.expect("bind");
    let addr = server.local_addr().expect("local addr");

    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(server.run(running));

    addr
}

type ClientStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr, query: Option<&str>) -> ClientStream {
    let url = match query {
        Some(q) => format!("ws://{addr}/ws?{q}"),
        None => format!("ws://{addr}/ws"),
    };
    let (ws, _response) = tokio_tungstenite::connect_async(url).await.expect("connect");
    ws
}

/// Reads frames until a text frame arrives, or panics after `wait`.
/// Control frames (pings) are skipped; reading also services the client's
/// automatic pong replies.
async fn next_text(ws: &mut ClientStream, wait: Duration) -> String {
    timeout(wait, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("stream ended while waiting for text: {other:?}"),
            }
        }
    })
    .await
    .expect("timed out waiting for a text frame")
}

/// Asserts that no text frame arrives within `window`.
async fn expect_silence(ws: &mut ClientStream, window: Duration) {
    let got = timeout(window, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                _ => std::future::pending::<()>().await,
            }
        }
    })
    .await;
    assert!(got.is_err(), "expected silence, got text frame: {got:?}");
}

fn append(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).expect("open for append");
    file.write_all(bytes).expect("append");
    file.flush().expect("flush");
}

// ── Incremental tailing ───────────────────────────────────────────────────────

/// Scenario A: existing content arrives first, then each append arrives as
/// exactly the appended bytes (nothing duplicated, nothing dropped), and an
/// idle source stays silent.
#[tokio::test]
async fn test_appends_stream_in_order_and_idle_is_silent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, "line1\n").unwrap();

    let addr = start_server(TailMode::Select(vec![path.clone()]), fast_timing()).await;
    let mut ws = connect(addr, Some(&format!("file={}", path.display()))).await;

    assert_eq!(next_text(&mut ws, Duration::from_secs(2)).await, "line1\n");

    append(&path, b"line2\n");
    assert_eq!(next_text(&mut ws, Duration::from_secs(2)).await, "line2\n");

    // No new data: several poll periods pass without a data frame.
    expect_silence(&mut ws, Duration::from_millis(300)).await;
}

/// Two viewers of the same file hold independent cursors: both see the
/// whole stream from the start.
#[tokio::test]
async fn test_two_viewers_get_independent_streams() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.log");
    std::fs::write(&path, "first\n").unwrap();

    let addr = start_server(TailMode::Select(vec![path.clone()]), fast_timing()).await;
    let query = format!("file={}", path.display());

    let mut ws_a = connect(addr, Some(&query)).await;
    let mut ws_b = connect(addr, Some(&query)).await;

    assert_eq!(next_text(&mut ws_a, Duration::from_secs(2)).await, "first\n");
    assert_eq!(next_text(&mut ws_b, Duration::from_secs(2)).await, "first\n");

    append(&path, b"second\n");
    assert_eq!(next_text(&mut ws_a, Duration::from_secs(2)).await, "second\n");
    assert_eq!(next_text(&mut ws_b, Duration::from_secs(2)).await, "second\n");
}

// ── Single-file rescan mode ───────────────────────────────────────────────────

/// Scenario B: content, then exactly one error message while the file is
/// missing, then the new content once it is recreated.
#[tokio::test]
async fn test_single_mode_reports_deletion_once_and_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.txt");
    std::fs::write(&path, "alive\n").unwrap();

    let addr = start_server(TailMode::Single(path.clone()), fast_timing()).await;
    let mut ws = connect(addr, None).await;

    assert_eq!(next_text(&mut ws, Duration::from_secs(2)).await, "alive\n");

    // Delete the file: many polls fail identically, one message arrives.
    std::fs::remove_file(&path).unwrap();
    let error_text = next_text(&mut ws, Duration::from_secs(2)).await;
    assert!(
        error_text.contains("no such file"),
        "unexpected error text: {error_text}"
    );

    // Let a handful of failing polls pass; the identical error must not be
    // re-sent.
    expect_silence(&mut ws, Duration::from_millis(300)).await;

    // Recreate: the next message is the new content, not another error.
    std::fs::write(&path, "back again\n").unwrap();
    assert_eq!(
        next_text(&mut ws, Duration::from_secs(2)).await,
        "back again\n"
    );
}

// ── Liveness ──────────────────────────────────────────────────────────────────

/// Heartbeats are independent of data: with nothing to tail, pings still
/// flow on their own cadence.
#[tokio::test]
async fn test_pings_flow_while_no_data_is_available() {
    let timing = TailTiming {
        write_wait: Duration::from_secs(2),
        pong_wait: Duration::from_secs(1),
        poll_period: Duration::from_millis(50),
    };
    let addr = start_server(TailMode::Stdin, timing).await;
    let mut ws = connect(addr, None).await;

    // Ping period is 450 ms here; one must arrive well within three seconds
    // even though no data frame ever does.
    let got_ping = timeout(Duration::from_secs(3), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Ping(_))) => return true,
                Some(Ok(Message::Text(text))) => panic!("unexpected data frame: {text}"),
                Some(Ok(_)) => continue,
                other => panic!("stream ended before a ping: {other:?}"),
            }
        }
    })
    .await
    .expect("no ping within the heartbeat window");
    assert!(got_ping);
}

/// Scenario C: a peer that never answers pings is disconnected within the
/// liveness window. The client here never reads, so its WebSocket never
/// sends the automatic pong replies.
#[tokio::test]
async fn test_silent_peer_is_disconnected_after_liveness_timeout() {
    let timing = TailTiming {
        write_wait: Duration::from_secs(2),
        pong_wait: Duration::from_millis(500),
        poll_period: Duration::from_millis(50),
    };
    let addr = start_server(TailMode::Stdin, timing).await;
    let mut ws = connect(addr, None).await;

    // Stay silent past the liveness window without reading (no reads → no
    // automatic pongs).
    tokio::time::sleep(Duration::from_millis(1200)).await;

    // The server has torn the session down; draining the stream now ends
    // in a close frame, an error, or end-of-stream.
    let ended = timeout(Duration::from_secs(3), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return true,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .expect("stream did not terminate after liveness timeout");
    assert!(ended);
}

// ── Plain HTTP surface ────────────────────────────────────────────────────────

/// The landing page lists every selectable file.
#[tokio::test]
async fn test_landing_page_lists_sources() {
    let dir = tempfile::tempdir().unwrap();
    let one = dir.path().join("one.log");
    let two = dir.path().join("two.log");
    std::fs::write(&one, "").unwrap();
    std::fs::write(&two, "").unwrap();

    let addr = start_server(
        TailMode::Select(vec![one.clone(), two.clone()]),
        fast_timing(),
    )
    .await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");
    assert!(response.contains("text/html"));
    assert!(response.contains(&one.display().to_string()));
    assert!(response.contains(&two.display().to_string()));
}

/// Unknown paths get a 404 without an upgrade.
#[tokio::test]
async fn test_unknown_path_is_404() {
    let addr = start_server(TailMode::Stdin, fast_timing()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 404"), "got: {response}");
}

/// A source name outside the configured set is rejected before the
/// handshake completes; the client sees the HTTP error, not a session.
#[tokio::test]
async fn test_unknown_source_is_rejected_with_404() {
    let dir = tempfile::tempdir().unwrap();
    let allowed = dir.path().join("allowed.log");
    std::fs::write(&allowed, "").unwrap();

    let addr = start_server(TailMode::Select(vec![allowed]), fast_timing()).await;

    let result =
        tokio_tungstenite::connect_async(format!("ws://{addr}/ws?file=/etc/hostname")).await;

    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 404),
        other => panic!("expected HTTP 404 rejection, got: {other:?}"),
    }
}

/// Multi-file mode without a `file` parameter is a 400.
#[tokio::test]
async fn test_missing_parameter_is_rejected_with_400() {
    let dir = tempfile::tempdir().unwrap();
    let allowed = dir.path().join("allowed.log");
    std::fs::write(&allowed, "").unwrap();

    let addr = start_server(TailMode::Select(vec![allowed]), fast_timing()).await;

    let result = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await;
    match result {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 400),
        other => panic!("expected HTTP 400 rejection, got: {other:?}"),
    }
}
