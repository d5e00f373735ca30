//! Handshake synchronizer
//!
//! Startup protocol: the device prints `READY`, then exactly one metadata line carrying
//! `time:<millis>`. The wall clock read at that moment and the reported counter value form
//! the session's [`SyncState`].
//!
//! ```text
//! WaitingReady --READY--> WaitingTimeField --time--> Ready
//!      |                        |
//!      +--budget exhausted--> Failed <--no/invalid time--+
//! ```

use contracts::{LineSource, SyncState, READY_TOKEN};
use ingestion::parse_line;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::clock::{Clock, SystemClock};

/// Handshake failure (fatal at startup)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupFailed {
    /// `READY` was not seen within the retry budget
    #[error("device did not report READY within {attempts} reads")]
    ReadyNotObserved { attempts: u32 },

    /// The line after `READY` had no `time` field
    #[error("metadata line after READY has no time field: {line:?}")]
    MissingTimeField { line: String },

    /// The `time` field is not an integer
    #[error("metadata line carries a non-integer time field: {value:?}")]
    InvalidTimeField { value: String },

    /// Termination was requested before the handshake finished
    #[error("handshake interrupted by termination request after {reads} reads")]
    Interrupted { reads: u32 },
}

/// Handshake state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeState {
    /// Pulling lines until `READY`, counting reads against the budget
    WaitingReady { attempts: u32 },
    /// `READY` seen; the next line must carry `time`
    WaitingTimeField,
    /// Terminal success
    Ready(SyncState),
    /// Terminal failure
    Failed(SetupFailed),
}

impl HandshakeState {
    /// Initial state for a retry budget
    ///
    /// A zero budget fails immediately without reading anything.
    pub fn start(retry_budget: u32) -> Self {
        if retry_budget == 0 {
            Self::Failed(SetupFailed::ReadyNotObserved { attempts: 0 })
        } else {
            Self::WaitingReady { attempts: 0 }
        }
    }

    /// Feed one line read from the device
    ///
    /// Terminal states ignore further lines.
    pub fn advance(self, line: &str, retry_budget: u32, clock: &impl Clock) -> Self {
        match self {
            Self::WaitingReady { attempts } => {
                let attempts = attempts + 1;
                if line == READY_TOKEN {
                    debug!(attempts, "Device reported READY");
                    Self::WaitingTimeField
                } else if attempts >= retry_budget {
                    Self::Failed(SetupFailed::ReadyNotObserved { attempts })
                } else {
                    warn!(attempts, retry_budget, "Device not ready yet");
                    Self::WaitingReady { attempts }
                }
            }
            Self::WaitingTimeField => {
                let sample = parse_line(line);
                match sample.device_millis() {
                    Ok(Some(millis)) => Self::Ready(SyncState::ready(millis, clock.now())),
                    Ok(None) => Self::Failed(SetupFailed::MissingTimeField {
                        line: line.to_string(),
                    }),
                    Err(_) => Self::Failed(SetupFailed::InvalidTimeField {
                        value: sample.get(contracts::TIME_KEY).unwrap_or_default().to_string(),
                    }),
                }
            }
            terminal => terminal,
        }
    }
}

/// Drives [`HandshakeState`] over a [`LineSource`]
#[derive(Debug, Clone, Default)]
pub struct HandshakeSynchronizer<C = SystemClock> {
    clock: C,
}

impl HandshakeSynchronizer<SystemClock> {
    /// Synchronizer using the host clock
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> HandshakeSynchronizer<C> {
    /// Synchronizer with an injected clock
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run the handshake to completion
    ///
    /// Reads at most `retry_budget` lines looking for `READY`, then exactly one more.
    /// Never reads past the metadata line.
    ///
    /// # Errors
    /// Returns [`SetupFailed`] when `READY` is not observed in time or the metadata line
    /// lacks a usable `time` field.
    pub async fn synchronize<S: LineSource>(
        &self,
        source: &mut S,
        retry_budget: u32,
    ) -> Result<SyncState, SetupFailed> {
        self.synchronize_until(source, retry_budget, || false).await
    }

    /// Same as [`synchronize`](Self::synchronize), but `should_stop` is polled before
    /// every read
    ///
    /// # Errors
    /// Additionally returns [`SetupFailed::Interrupted`] once `should_stop` reports true.
    #[instrument(name = "handshake_synchronize", skip_all, fields(source = %source.name()))]
    pub async fn synchronize_until<S, F>(
        &self,
        source: &mut S,
        retry_budget: u32,
        should_stop: F,
    ) -> Result<SyncState, SetupFailed>
    where
        S: LineSource,
        F: Fn() -> bool,
    {
        let mut state = HandshakeState::start(retry_budget);
        let mut reads = 0u32;

        loop {
            match state {
                HandshakeState::Ready(sync) => {
                    info!(
                        device_base_millis = sync.device_base_millis(),
                        wall_base = %sync.wall_base(),
                        "Handshake complete"
                    );
                    return Ok(sync);
                }
                HandshakeState::Failed(e) => return Err(e),
                pending => {
                    if should_stop() {
                        info!(reads, "Handshake interrupted");
                        return Err(SetupFailed::Interrupted { reads });
                    }
                    let line = source.read_line().await;
                    reads += 1;
                    state = pending.advance(&line, retry_budget, &self.clock);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{DateTime, Utc};
    use ingestion::MockLineSource;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn test_handshake_success() {
        let mut source = MockLineSource::new(["noise", "READY", "temp:1,time:1000"]);
        let sync = HandshakeSynchronizer::with_clock(FixedClock(t0()))
            .synchronize(&mut source, 5)
            .await
            .unwrap();

        assert!(sync.is_ready());
        assert_eq!(sync.device_base_millis(), 1000);
        assert_eq!(sync.wall_base(), t0());
    }

    #[tokio::test]
    async fn test_handshake_ready_not_observed() {
        let mut source = MockLineSource::new(["a", "b", "c"]);
        let result = HandshakeSynchronizer::with_clock(FixedClock(t0()))
            .synchronize(&mut source, 3)
            .await;

        assert_eq!(result, Err(SetupFailed::ReadyNotObserved { attempts: 3 }));
        assert_eq!(source.reads(), 3);
    }

    #[tokio::test]
    async fn test_handshake_does_not_read_past_metadata() {
        let mut source = MockLineSource::new(["READY", "time:42", "temp:1,time:43"]);
        HandshakeSynchronizer::with_clock(FixedClock(t0()))
            .synchronize(&mut source, 5)
            .await
            .unwrap();

        assert_eq!(source.reads(), 2);
        assert_eq!(source.remaining(), 1);
    }

    #[tokio::test]
    async fn test_handshake_missing_time_does_not_retry() {
        let mut source = MockLineSource::new(["READY", "temp:1", "time:5"]);
        let result = HandshakeSynchronizer::with_clock(FixedClock(t0()))
            .synchronize(&mut source, 10)
            .await;

        assert!(matches!(result, Err(SetupFailed::MissingTimeField { .. })));
        assert_eq!(source.reads(), 2);
    }

    #[tokio::test]
    async fn test_handshake_invalid_time() {
        let mut source = MockLineSource::new(["READY", "time:soon"]);
        let result = HandshakeSynchronizer::with_clock(FixedClock(t0()))
            .synchronize(&mut source, 10)
            .await;

        assert_eq!(
            result,
            Err(SetupFailed::InvalidTimeField {
                value: "soon".into()
            })
        );
    }

    #[tokio::test]
    async fn test_handshake_ready_on_last_attempt() {
        let mut source = MockLineSource::new(["x", "x", "READY", "time:7"]);
        let sync = HandshakeSynchronizer::with_clock(FixedClock(t0()))
            .synchronize(&mut source, 3)
            .await
            .unwrap();
        assert_eq!(sync.device_base_millis(), 7);
    }

    #[tokio::test]
    async fn test_handshake_zero_budget_reads_nothing() {
        let mut source = MockLineSource::new(["READY", "time:1"]);
        let result = HandshakeSynchronizer::with_clock(FixedClock(t0()))
            .synchronize(&mut source, 0)
            .await;

        assert!(result.is_err());
        assert_eq!(source.reads(), 0);
    }

    #[tokio::test]
    async fn test_handshake_stops_before_reading() {
        let mut source = MockLineSource::new(["boot", "READY", "time:1"]);
        let result = HandshakeSynchronizer::with_clock(FixedClock(t0()))
            .synchronize_until(&mut source, 5, || true)
            .await;

        assert_eq!(result, Err(SetupFailed::Interrupted { reads: 0 }));
        assert_eq!(source.reads(), 0);
    }

    #[tokio::test]
    async fn test_handshake_stops_while_waiting_for_ready() {
        let mut source = MockLineSource::new(["boot", "boot", "boot", "READY", "time:1"]);
        let handle = source.handle();
        let result = HandshakeSynchronizer::with_clock(FixedClock(t0()))
            .synchronize_until(&mut source, 10, || handle.reads() >= 2)
            .await;

        assert_eq!(result, Err(SetupFailed::Interrupted { reads: 2 }));
        assert_eq!(source.remaining(), 3);
    }

    #[test]
    fn test_state_transitions() {
        let clock = FixedClock(t0());
        let state = HandshakeState::start(2);
        assert_eq!(state, HandshakeState::WaitingReady { attempts: 0 });

        let state = state.advance("", 2, &clock);
        assert_eq!(state, HandshakeState::WaitingReady { attempts: 1 });

        let state = state.advance("READY", 2, &clock);
        assert_eq!(state, HandshakeState::WaitingTimeField);

        let state = state.advance("time:9", 2, &clock);
        assert_eq!(state, HandshakeState::Ready(SyncState::ready(9, t0())));

        // Terminal states ignore further input
        let state = state.advance("READY", 2, &clock);
        assert!(matches!(state, HandshakeState::Ready(_)));
    }

    #[test]
    fn test_ready_must_match_exactly() {
        let clock = FixedClock(t0());
        let state = HandshakeState::start(5).advance("READY!", 5, &clock);
        assert_eq!(state, HandshakeState::WaitingReady { attempts: 1 });
        let state = state.advance("ready", 5, &clock);
        assert_eq!(state, HandshakeState::WaitingReady { attempts: 2 });
    }
}
