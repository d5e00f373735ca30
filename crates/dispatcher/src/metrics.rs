//! Per-sink delivery counters

use crate::dispatcher::Delivery;

/// Delivery tally for one sink
///
/// Owned by the dispatcher and updated after every attempt; the session loop is
/// single-threaded so plain integers suffice.
#[derive(Debug, Default, Clone, Copy)]
pub struct SinkMetrics {
    sent: u64,
    failed: u64,
    empty: u64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one delivery attempt
    pub fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Sent => self.sent += 1,
            Delivery::Failed => self.failed += 1,
            Delivery::Empty => self.empty += 1,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            write_count: self.sent,
            failure_count: self.failed,
            empty_count: self.empty,
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Payloads the sink accepted
    pub write_count: u64,
    /// Attempts that failed
    pub failure_count: u64,
    /// Samples with nothing to send to this sink
    pub empty_count: u64,
}
