//! Session timer constants and their derivation rules.

use std::time::Duration;

use thiserror::Error;

/// Timer settings for one tail session.
///
/// Three values are configured; the heartbeat period is *derived* so the
/// safety margin between pings and the liveness deadline stays auditable:
///
/// | Timer         | Meaning                                            | Default |
/// |---------------|----------------------------------------------------|---------|
/// | `write_wait`  | Deadline for any single frame write                | 10 s    |
/// | `pong_wait`   | Liveness timeout: max gap between peer pongs       | 60 s    |
/// | `poll_period` | How often the source is checked for new bytes      | 100 ms  |
///
/// Pings are sent at 45 % of `pong_wait` (see [`ping_period`]), comfortably
/// under the deadline so a single delayed pong does not kill the session.
///
/// [`ping_period`]: TailTiming::ping_period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailTiming {
    /// Deadline for writing one frame to the peer.
    pub write_wait: Duration,
    /// Liveness timeout. The session dies when no pong arrives for this long.
    pub pong_wait: Duration,
    /// Poll interval for the source. Expected to be much shorter than the
    /// heartbeat period (milliseconds vs. tens of seconds).
    pub poll_period: Duration,
}

impl TailTiming {
    /// Heartbeat period: `pong_wait * 9 / 20` (45 % of the liveness timeout).
    pub fn ping_period(&self) -> Duration {
        self.pong_wait * 9 / 20
    }

    /// Rejects degenerate settings before a session runs with them.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError`] when any timer is zero (an interval timer
    /// cannot fire on a zero period) or when the derived ping period would
    /// not be strictly shorter than the liveness timeout.
    pub fn validate(&self) -> Result<(), TimingError> {
        if self.write_wait.is_zero() {
            return Err(TimingError::Zero { name: "write_wait" });
        }
        if self.pong_wait.is_zero() {
            return Err(TimingError::Zero { name: "pong_wait" });
        }
        if self.poll_period.is_zero() {
            return Err(TimingError::Zero { name: "poll_period" });
        }
        if self.ping_period() >= self.pong_wait {
            return Err(TimingError::PingNotUnderPongWait {
                ping: self.ping_period(),
                pong_wait: self.pong_wait,
            });
        }
        Ok(())
    }
}

impl Default for TailTiming {
    fn default() -> Self {
        Self {
            write_wait: Duration::from_secs(10),
            pong_wait: Duration::from_secs(60),
            poll_period: Duration::from_millis(100),
        }
    }
}

/// Rejected timer settings.
#[derive(Debug, Error)]
pub enum TimingError {
    /// A timer was configured as zero.
    #[error("{name} must be non-zero")]
    Zero {
        /// Which timer.
        name: &'static str,
    },

    /// The derived heartbeat period is not under the liveness timeout.
    #[error("ping period {ping:?} must be strictly shorter than pong wait {pong_wait:?}")]
    PingNotUnderPongWait {
        /// Derived ping period.
        ping: Duration,
        /// Configured liveness timeout.
        pong_wait: Duration,
    },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
