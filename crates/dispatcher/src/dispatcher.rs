//! Dispatcher - turns a translated sample into sink payloads and fans them out

use contracts::{
    BridgeConfig, ContractError, LogRecord, LogSink, MetricPoint, MetricsSink, ParsedSample,
    SyncState,
};
use sync_engine::{epoch_nanos, epoch_seconds, translate};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{CarbonSink, LokiSink};

/// Why a sample produced no payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// No `time` field: the sample cannot be placed in time
    #[error("sample has no time field")]
    MissingTime,

    /// `time` is present but not an integer
    #[error("time field is not an integer: {0:?}")]
    InvalidTime(String),

    /// A metric value is not a number
    #[error("metric '{key}' is not a number: {value:?}")]
    MalformedValue { key: String, value: String },

    /// Translated instant falls outside the representable range
    #[error("device time {0}ms cannot be represented as a wall-clock instant")]
    OutOfRange(i64),
}

impl SkipReason {
    /// Short label (for metrics)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTime => "missing_time",
            Self::InvalidTime(_) => "invalid_time",
            Self::MalformedValue { .. } => "malformed_value",
            Self::OutOfRange(_) => "out_of_range",
        }
    }
}

/// Both payloads derived from one line
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// One point per non-time key, in line order
    pub points: Vec<MetricPoint>,
    pub record: LogRecord,
}

/// Build the sink payloads for one sample
///
/// All-or-nothing: any value that fails to parse drops the whole sample.
///
/// # Panics
/// Panics if `state` is not ready (see [`translate`]).
pub fn build_payload(
    prefix: &str,
    sample: &ParsedSample,
    line: &str,
    state: &SyncState,
) -> Result<Payload, SkipReason> {
    let device_millis = match sample.device_millis() {
        Ok(Some(millis)) => millis,
        Ok(None) => return Err(SkipReason::MissingTime),
        Err(_) => {
            let raw = sample.get(contracts::TIME_KEY).unwrap_or_default();
            return Err(SkipReason::InvalidTime(raw.to_string()));
        }
    };

    let instant = translate(state, device_millis).ok_or(SkipReason::OutOfRange(device_millis))?;
    let nanos = epoch_nanos(instant).ok_or(SkipReason::OutOfRange(device_millis))?;
    let seconds = epoch_seconds(instant);

    let points = sample
        .metric_values()
        .map(|entry| {
            entry
                .map(|(key, value)| MetricPoint::new(prefix, key, seconds, value))
                .map_err(|e| match e {
                    ContractError::MalformedValue { key, value } => {
                        SkipReason::MalformedValue { key, value }
                    }
                    other => SkipReason::MalformedValue {
                        key: String::new(),
                        value: other.to_string(),
                    },
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Payload {
        points,
        record: LogRecord {
            epoch_nanos: nanos,
            line: line.to_string(),
        },
    })
}

/// Result of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sink accepted the payload
    Sent,
    /// Nothing to send (metric batch was empty)
    Empty,
    /// Sink failed; logged and counted, not retried
    Failed,
}

/// What happened to one sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No payload was built, neither sink was contacted
    Skipped(SkipReason),
    /// Both sinks were attempted independently
    Attempted { metrics: Delivery, logs: Delivery },
}

impl DispatchOutcome {
    /// Whether every attempted delivery succeeded
    pub fn is_delivered(&self) -> bool {
        matches!(
            self,
            Self::Attempted {
                metrics: Delivery::Sent | Delivery::Empty,
                logs: Delivery::Sent,
            }
        )
    }
}

/// Fans each sample out to a metrics sink and a log sink
///
/// Delivery is sequential and best-effort: each sink is tried exactly once per sample,
/// and a failure on one never prevents the attempt on the other.
pub struct Dispatcher<M, L> {
    prefix: String,
    metrics_sink: M,
    log_sink: L,
    metrics_stats: SinkMetrics,
    log_stats: SinkMetrics,
}

impl<M: MetricsSink, L: LogSink> Dispatcher<M, L> {
    /// Create a dispatcher over two sinks
    pub fn new(prefix: impl Into<String>, metrics_sink: M, log_sink: L) -> Self {
        Self {
            prefix: prefix.into(),
            metrics_sink,
            log_sink,
            metrics_stats: SinkMetrics::new(),
            log_stats: SinkMetrics::new(),
        }
    }

    /// Metric path prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `(metrics sink, log sink)` names
    pub fn sink_names(&self) -> (&str, &str) {
        (self.metrics_sink.name(), self.log_sink.name())
    }

    /// Get metrics for both sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        vec![
            (
                self.metrics_sink.name().to_string(),
                self.metrics_stats.snapshot(),
            ),
            (self.log_sink.name().to_string(), self.log_stats.snapshot()),
        ]
    }

    /// Translate and deliver one sample
    ///
    /// Never fails: problems are reported through the outcome and the log.
    #[instrument(name = "dispatcher_dispatch", skip_all, fields(keys = sample.len()))]
    pub async fn dispatch(
        &mut self,
        sample: &ParsedSample,
        line: &str,
        state: &SyncState,
    ) -> DispatchOutcome {
        let payload = match build_payload(&self.prefix, sample, line, state) {
            Ok(payload) => payload,
            Err(reason) => {
                match &reason {
                    SkipReason::MissingTime => debug!(line = %line, "Skipping sample without time"),
                    other => warn!(line = %line, reason = %other, "Dropping sample"),
                }
                return DispatchOutcome::Skipped(reason);
            }
        };

        let metrics = self.deliver_points(&payload.points).await;
        let logs = self.deliver_record(&payload.record).await;

        DispatchOutcome::Attempted { metrics, logs }
    }

    async fn deliver_points(&mut self, points: &[MetricPoint]) -> Delivery {
        let delivery = if points.is_empty() {
            Delivery::Empty
        } else {
            match self.metrics_sink.send_points(points).await {
                Ok(()) => Delivery::Sent,
                Err(e) => {
                    warn!(sink = %self.metrics_sink.name(), error = %e, "Failed to send metrics");
                    Delivery::Failed
                }
            }
        };
        self.metrics_stats.record(delivery);
        delivery
    }

    async fn deliver_record(&mut self, record: &LogRecord) -> Delivery {
        let delivery = match self.log_sink.send_record(record).await {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                warn!(sink = %self.log_sink.name(), error = %e, "Failed to send logs");
                Delivery::Failed
            }
        };
        self.log_stats.record(delivery);
        delivery
    }

    /// Give back the sinks (for inspection after a session)
    pub fn into_sinks(self) -> (M, L) {
        (self.metrics_sink, self.log_sink)
    }
}

/// Create the production dispatcher (Carbon + Loki) from configuration
pub fn create_dispatcher(
    config: &BridgeConfig,
) -> Result<Dispatcher<CarbonSink, LokiSink>, DispatcherError> {
    let carbon = CarbonSink::from_config(&config.metrics);
    let loki = LokiSink::from_config(&config.logs)
        .map_err(|e| DispatcherError::sink_creation("loki", e.to_string()))?;
    Ok(Dispatcher::new(config.metrics.prefix.clone(), carbon, loki))
}
