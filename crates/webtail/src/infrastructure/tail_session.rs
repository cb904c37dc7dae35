//! The tail session: one duplex connection, one source, two loops.
//!
//! A session owns an upgraded WebSocket connection and the source selected
//! for it, and drives two concurrent loops over the split stream:
//!
//! - **Outbound loop** (its own Tokio task): polls the source on a fixed
//!   interval and forwards new bytes to the peer as text frames; on an
//!   independent interval it sends empty ping frames so a silent peer is
//!   detected even when no data flows. Every write carries a bounded
//!   deadline.
//! - **Inbound loop**: reads the peer's frames. Pongs extend the liveness
//!   deadline; everything else is logged and ignored. If neither a pong nor
//!   any read completes before the deadline, the peer is dead.
//!
//! Either loop exiting (write failure, read failure, peer close, liveness
//! expiry) ends the session: the other loop is aborted, and dropping the
//! two halves closes the connection and the source handle exactly once.
//!
//! Only the outbound loop ever writes frames and only the inbound loop ever
//! reads them, so the two tasks never contend on a direction and the sink
//! serializes whole frames; data frames go out in source order, with pings
//! interleaved between (never inside) them.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{interval, timeout, timeout_at, Instant};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use webtail_core::{ErrorDedup, SourceError, SourceReader, TailTiming};

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// A live per-connection unit of work.
pub struct TailSession {
    id: Uuid,
    timing: TailTiming,
}

impl TailSession {
    /// Prepares a session with a fresh identifier for log correlation.
    pub fn new(timing: TailTiming) -> Self {
        Self {
            id: Uuid::new_v4(),
            timing,
        }
    }

    /// Session identifier used in log output.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Runs the session to completion.
    ///
    /// Returns when the connection dies, the peer closes, or the peer stops
    /// answering pings. There is no cancel operation: sessions end through
    /// failure, disconnect, or process shutdown (which aborts the whole
    /// task, releasing both halves the same way).
    pub async fn run(self, ws: WebSocketStream<TcpStream>, source: SourceReader) {
        let label = source.describe();
        info!(session = %self.id, source = %label, "tail session active");

        let (ws_tx, ws_rx) = ws.split();

        let mut outbound = tokio::spawn(outbound_loop(ws_tx, source, self.timing.clone(), self.id));
        let mut inbound = tokio::spawn(inbound_loop(ws_rx, self.timing.clone(), self.id));

        // The loops race to detect death; whichever exits first drives
        // teardown and the loser is aborted so both stop within one tick.
        tokio::select! {
            _ = &mut outbound => inbound.abort(),
            _ = &mut inbound => outbound.abort(),
        }

        info!(session = %self.id, source = %label, "tail session closed");
    }
}

// ── Outbound loop ─────────────────────────────────────────────────────────────

/// What a single poll tick should put on the wire.
#[derive(Debug, PartialEq, Eq)]
enum PollOutcome {
    /// Nothing this tick: no new data, or a repeat of the last reported error.
    Quiet,
    /// Send these bytes as one text frame (new data, or a changed error text).
    Send(Vec<u8>),
}

/// Applies the reporting rules to one poll result.
///
/// Successful polls clear the error gate, even empty ones, so a source
/// that recovers and then fails the same way again is reported again.
fn classify_poll(result: Result<Vec<u8>, SourceError>, dedup: &mut ErrorDedup) -> PollOutcome {
    match result {
        Ok(bytes) => {
            dedup.clear();
            if bytes.is_empty() {
                PollOutcome::Quiet
            } else {
                PollOutcome::Send(bytes)
            }
        }
        Err(err) => match dedup.observe(&err) {
            Some(text) => PollOutcome::Send(text.into_bytes()),
            None => PollOutcome::Quiet,
        },
    }
}

/// Polls the source and the ping timer until a write fails.
///
/// The two timers are independent; `select!` runs whichever fires first and
/// neither can starve the other, since both arms always return to the
/// select point.
async fn outbound_loop(mut ws_tx: WsSink, mut source: SourceReader, timing: TailTiming, id: Uuid) {
    let mut poll_tick = interval(timing.poll_period);
    let mut ping_tick = interval(timing.ping_period());

    // An interval's first tick completes immediately: right for the poll
    // timer (stream existing content at once), pointless for the ping timer.
    ping_tick.tick().await;

    let mut dedup = ErrorDedup::new();

    loop {
        tokio::select! {
            _ = poll_tick.tick() => {
                match classify_poll(source.poll_increment(), &mut dedup) {
                    PollOutcome::Quiet => {}
                    PollOutcome::Send(bytes) => {
                        let text = String::from_utf8_lossy(&bytes).into_owned();
                        if !send_frame(&mut ws_tx, Message::Text(text), &timing, id).await {
                            break;
                        }
                    }
                }
            }
            _ = ping_tick.tick() => {
                if !send_frame(&mut ws_tx, Message::Ping(Vec::new()), &timing, id).await {
                    break;
                }
            }
        }
    }

    debug!(session = %id, "outbound loop ended");
}

/// Sends one frame under the write deadline. Returns `false` when the
/// session must end.
async fn send_frame(ws_tx: &mut WsSink, frame: Message, timing: &TailTiming, id: Uuid) -> bool {
    match timeout(timing.write_wait, ws_tx.send(frame)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!(session = %id, "frame send failed: {e}");
            false
        }
        Err(_) => {
            warn!(session = %id, "frame send exceeded write deadline");
            false
        }
    }
}

// ── Inbound loop ──────────────────────────────────────────────────────────────

/// Reads peer frames until the connection errors, the peer closes, or the
/// liveness deadline passes without a pong.
///
/// Oversized inbound messages surface as capacity errors from the framing
/// layer (the upgrade configured a maximum message size); they are dropped
/// rather than fatal, though a peer that keeps violating the limit will
/// eventually break the stream and end the session through the read-failure
/// path.
async fn inbound_loop(mut ws_rx: WsSource, timing: TailTiming, id: Uuid) {
    let mut alive_until = Instant::now() + timing.pong_wait;

    loop {
        let frame = match timeout_at(alive_until, ws_rx.next()).await {
            Err(_) => {
                warn!(session = %id, "liveness deadline passed without a pong");
                break;
            }
            Ok(None) => {
                debug!(session = %id, "peer stream ended");
                break;
            }
            Ok(Some(Err(WsError::Capacity(e)))) => {
                warn!(session = %id, "dropping oversized inbound frame: {e}");
                continue;
            }
            Ok(Some(Err(WsError::ConnectionClosed | WsError::Protocol(_)))) => {
                debug!(session = %id, "peer connection closed");
                break;
            }
            Ok(Some(Err(e))) => {
                warn!(session = %id, "read from peer failed: {e}");
                break;
            }
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Message::Pong(_) => {
                alive_until = Instant::now() + timing.pong_wait;
            }
            Message::Ping(payload) => {
                // The framing layer queues the reply pong itself.
                debug!(session = %id, bytes = payload.len(), "peer ping");
            }
            Message::Text(text) => {
                // The protocol is one-directional for data; the peer picks
                // its source at connection time and sends nothing after.
                debug!(session = %id, "ignoring text frame from peer: {text:?}");
            }
            Message::Binary(payload) => {
                debug!(session = %id, bytes = payload.len(), "ignoring binary frame from peer");
            }
            Message::Close(_) => {
                debug!(session = %id, "peer sent close frame");
                break;
            }
            Message::Frame(_) => {
                debug!(session = %id, "ignoring raw frame from peer");
            }
        }
    }

    debug!(session = %id, "inbound loop ended");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::Path;

    fn not_found() -> SourceError {
        SourceError::from_io(
            Path::new("/tmp/gone.log"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        )
    }

    #[test]
    fn test_new_data_is_sent() {
        let mut dedup = ErrorDedup::new();
        let outcome = classify_poll(Ok(b"line\n".to_vec()), &mut dedup);
        assert_eq!(outcome, PollOutcome::Send(b"line\n".to_vec()));
    }

    #[test]
    fn test_idle_poll_is_quiet_not_an_empty_send() {
        let mut dedup = ErrorDedup::new();
        let outcome = classify_poll(Ok(Vec::new()), &mut dedup);
        assert_eq!(outcome, PollOutcome::Quiet);
    }

    #[test]
    fn test_repeated_error_is_sent_once() {
        let mut dedup = ErrorDedup::new();

        let first = classify_poll(Err(not_found()), &mut dedup);
        assert!(matches!(first, PollOutcome::Send(_)));

        for _ in 0..5 {
            assert_eq!(classify_poll(Err(not_found()), &mut dedup), PollOutcome::Quiet);
        }
    }

    #[test]
    fn test_error_text_is_the_displayed_content() {
        let mut dedup = ErrorDedup::new();
        let expected = not_found().to_string().into_bytes();
        assert_eq!(
            classify_poll(Err(not_found()), &mut dedup),
            PollOutcome::Send(expected)
        );
    }

    #[test]
    fn test_recovery_then_recurrence_reports_again() {
        let mut dedup = ErrorDedup::new();

        assert!(matches!(
            classify_poll(Err(not_found()), &mut dedup),
            PollOutcome::Send(_)
        ));

        // Successful poll (even an idle one) clears the gate.
        assert_eq!(classify_poll(Ok(Vec::new()), &mut dedup), PollOutcome::Quiet);

        // The same error recurring is a new report.
        assert!(matches!(
            classify_poll(Err(not_found()), &mut dedup),
            PollOutcome::Send(_)
        ));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = TailSession::new(TailTiming::default());
        let b = TailSession::new(TailTiming::default());
        assert_ne!(a.id(), b.id());
    }
}
