//! Wall clock source and device-time translation

use chrono::{DateTime, TimeDelta, Utc};
use contracts::SyncState;

/// Wall clock source
///
/// Injected into the handshake so tests can pin the origin instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Host system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Map a device millisecond counter value to a wall-clock instant
///
/// `wall_base + (device_millis - device_base_millis) ms`. Values earlier than the handshake
/// origin map before `wall_base`; nothing is clamped. Returns `None` only when the result
/// falls outside the representable date range.
///
/// # Panics
/// Panics if `state` is not ready: translating before the handshake completed is a
/// programming error.
pub fn translate(state: &SyncState, device_millis: i64) -> Option<DateTime<Utc>> {
    assert!(
        state.is_ready(),
        "translate called before the handshake established a sync state"
    );
    let delta = TimeDelta::try_milliseconds(device_millis.checked_sub(state.device_base_millis())?)?;
    state.wall_base().checked_add_signed(delta)
}

/// Whole seconds since the Unix epoch, floored
pub fn epoch_seconds(instant: DateTime<Utc>) -> i64 {
    instant.timestamp()
}

/// Nanoseconds since the Unix epoch
///
/// `None` outside the i64 nanosecond range (before 1677 or after 2262).
pub fn epoch_nanos(instant: DateTime<Utc>) -> Option<i64> {
    instant.timestamp_nanos_opt()
}
