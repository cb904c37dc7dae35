//! Standard-input tailing through a background reader thread.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::debug;

use crate::source::error::SourceError;

/// Drains standard input one buffered line per poll.
///
/// Standard input cannot be read with a timeout through `std`, so a
/// dedicated thread performs the blocking `read_until` calls and hands each
/// completed read over a channel. `poll_increment` only ever does a
/// non-blocking `try_recv`, which keeps the session's poll tick prompt
/// regardless of how long input takes to arrive.
///
/// There is no persistent cursor: standard input is a forward-only stream
/// that is consumed as it is read, and it cannot be rewound or reselected.
/// After end-of-input the reader thread exits and every later poll returns
/// empty.
#[derive(Debug)]
pub struct StdinSource {
    rx: Receiver<io::Result<Vec<u8>>>,
}

impl StdinSource {
    /// Binds to the process's standard input.
    pub fn stdin() -> Self {
        Self::from_reader(io::stdin())
    }

    /// Binds to an arbitrary reader. Tests use this with in-memory readers.
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut reader = BufReader::new(reader);
            loop {
                let mut line = Vec::new();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) => {
                        debug!("input stream reached end-of-input; reader thread exiting");
                        break;
                    }
                    Ok(_) => {
                        if tx.send(Ok(line)).is_err() {
                            // Receiver dropped: the owning session is gone.
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }
        });
        Self { rx }
    }

    /// Returns the next buffered line, or empty when none is ready.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] when the underlying read failed; the
    /// reader thread stops after the first failure.
    pub fn poll_increment(&mut self) -> Result<Vec<u8>, SourceError> {
        match self.rx.try_recv() {
            Ok(Ok(line)) => Ok(line),
            Ok(Err(source)) => Err(SourceError::Io { source }),
            // Empty: no complete read yet. Disconnected: end-of-input was
            // reached and the thread exited; both are quiet polls.
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(Vec::new()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Polls until the reader thread has had a chance to deliver, so tests
    /// don't race the thread startup.
    fn poll_with_patience(source: &mut StdinSource) -> Vec<u8> {
        for _ in 0..50 {
            let got = source.poll_increment().unwrap();
            if !got.is_empty() {
                return got;
            }
            thread::sleep(Duration::from_millis(10));
        }
        Vec::new()
    }

    #[test]
    fn test_lines_arrive_one_per_poll() {
        let mut source = StdinSource::from_reader(io::Cursor::new(b"first\nsecond\n".to_vec()));

        assert_eq!(poll_with_patience(&mut source), b"first\n");
        assert_eq!(poll_with_patience(&mut source), b"second\n");
    }

    #[test]
    fn test_exhausted_input_polls_empty_forever() {
        let mut source = StdinSource::from_reader(io::Cursor::new(b"only\n".to_vec()));
        assert_eq!(poll_with_patience(&mut source), b"only\n");

        // Reader thread has exited; polls stay quiet rather than erroring.
        thread::sleep(Duration::from_millis(20));
        assert_eq!(source.poll_increment().unwrap(), b"");
        assert_eq!(source.poll_increment().unwrap(), b"");
    }

    #[test]
    fn test_trailing_bytes_without_terminator_are_delivered() {
        let mut source = StdinSource::from_reader(io::Cursor::new(b"no newline".to_vec()));
        assert_eq!(poll_with_patience(&mut source), b"no newline");
    }

    #[test]
    fn test_empty_input_is_quiet() {
        let mut source = StdinSource::from_reader(io::Cursor::new(Vec::new()));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(source.poll_increment().unwrap(), b"");
    }
}
