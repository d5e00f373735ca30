//! Session statistics

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::SessionMetricsAggregator;

/// Statistics from one bridge session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Last sample number handed out (-1 if none)
    pub last_sequence: i64,

    /// Time from handshake completion to shutdown
    pub duration: Duration,

    /// Whether the loop stopped on a termination request rather than link closure
    pub shutdown_requested: bool,

    /// Per-sink write/failure counters
    pub sinks: Vec<(String, MetricsSnapshot)>,

    /// Line and sample counters
    pub metrics: SessionMetricsAggregator,
}

impl SessionStats {
    pub fn samples_dispatched(&self) -> u64 {
        self.metrics.samples_dispatched
    }

    pub fn samples_dropped(&self) -> u64 {
        self.metrics.total_dropped()
    }

    /// Non-empty lines per second
    pub fn line_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.metrics.lines_read as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!();
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Line rate: {:.2}/s", self.line_rate());
        println!("Last sample: {}", self.last_sequence);
        println!(
            "Stopped by: {}",
            if self.shutdown_requested {
                "termination signal"
            } else {
                "link closed"
            }
        );
        print!("{}", self.metrics.summary());

        println!("Sinks:");
        for (name, snapshot) in &self.sinks {
            println!(
                "  {}: {} sent, {} failed",
                name, snapshot.write_count, snapshot.failure_count
            );
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_rate() {
        let mut stats = SessionStats {
            duration: Duration::from_secs(4),
            ..Default::default()
        };
        stats.metrics.lines_read = 10;
        assert!((stats.line_rate() - 2.5).abs() < 1e-10);

        stats.duration = Duration::ZERO;
        assert_eq!(stats.line_rate(), 0.0);
    }
}
