//! SyncState - HandshakeSynchronizer output
//!
//! Device-time to wall-clock origin mapping.

use chrono::{DateTime, Utc};

/// Line the device emits when it is about to send its metadata line
pub const READY_TOKEN: &str = "READY";

/// Origin mapping established by the handshake
///
/// Immutable once ready: there is no setter, and a ready state can only be built through
/// [`SyncState::ready`]. Never recomputed during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncState {
    ready: bool,
    device_base_millis: i64,
    wall_base: DateTime<Utc>,
}

impl SyncState {
    /// State before the handshake completed
    pub fn pending() -> Self {
        Self {
            ready: false,
            device_base_millis: 0,
            wall_base: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// State captured at handshake completion
    pub fn ready(device_base_millis: i64, wall_base: DateTime<Utc>) -> Self {
        Self {
            ready: true,
            device_base_millis,
            wall_base,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Device counter value reported in the metadata line
    pub fn device_base_millis(&self) -> i64 {
        self.device_base_millis
    }

    /// Wall clock at the moment the metadata line was read
    pub fn wall_base(&self) -> DateTime<Utc> {
        self.wall_base
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_not_ready() {
        assert!(!SyncState::default().is_ready());
    }

    #[test]
    fn test_ready_state() {
        let t0 = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let state = SyncState::ready(1000, t0);
        assert!(state.is_ready());
        assert_eq!(state.device_base_millis(), 1000);
        assert_eq!(state.wall_base(), t0);
    }
}
