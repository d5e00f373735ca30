//! Sink traits - Dispatcher output interfaces
//!
//! The metrics store and the log aggregator are capabilities; the dispatcher only sees
//! these traits.

use crate::{ContractError, LogRecord, MetricPoint};

/// Time-series store
#[trait_variant::make(MetricsSink: Send)]
pub trait LocalMetricsSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one batch of points
    ///
    /// # Errors
    /// Returns transport or encoding error (should include context)
    async fn send_points(&mut self, points: &[MetricPoint]) -> Result<(), ContractError>;
}

/// Log aggregator
#[trait_variant::make(LogSink: Send)]
pub trait LocalLogSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one record
    ///
    /// # Errors
    /// Returns transport error or a rejection status
    async fn send_record(&mut self, record: &LogRecord) -> Result<(), ContractError>;
}
