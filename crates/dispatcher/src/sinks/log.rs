//! ConsoleSink - logs payloads via tracing instead of shipping them
//!
//! Stands in for both backends on a bench without Carbon or Loki.

use contracts::{ContractError, LogRecord, LogSink, MetricPoint, MetricsSink};
use tracing::info;

/// Sink that logs payload summaries
pub struct ConsoleSink {
    name: String,
}

impl ConsoleSink {
    /// Create a new ConsoleSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl MetricsSink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_points(&mut self, points: &[MetricPoint]) -> Result<(), ContractError> {
        for point in points {
            info!(
                sink = %self.name,
                path = %point.path,
                epoch_seconds = point.epoch_seconds,
                value = point.value,
                "MetricPoint"
            );
        }
        Ok(())
    }
}

impl LogSink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_record(&mut self, record: &LogRecord) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            epoch_nanos = record.epoch_nanos,
            line = %record.line,
            "LogRecord"
        );
        Ok(())
    }
}
