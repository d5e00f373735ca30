//! Session runner
//!
//! Startup performs the handshake; the steady state reads one line at a time, parses it,
//! and dispatches it before reading the next. Everything runs on the caller's task.

use std::time::Instant;

use contracts::{LineSource, LogSink, MetricsSink, ParsedSample, SyncState};
use dispatcher::{Delivery, DispatchOutcome, Dispatcher};
use ingestion::parse_line;
use observability::{
    record_device_lag_ms, record_handshake, record_line_read, record_sample_dispatched,
    record_sample_dropped, record_sink_failure, SessionMetricsAggregator,
};
use sync_engine::{
    translate, Clock, HandshakeSynchronizer, SampleSequencer, SetupFailed, SystemClock,
};
use tracing::{error, info, instrument, trace, warn};

use super::{SessionStats, ShutdownFlag};
use crate::error::Result;

const DEFAULT_RETRY_BUDGET: u32 = 30;

/// One bridge session over a line source and two sinks
pub struct Session<S, M, L, C = SystemClock> {
    source: S,
    dispatcher: Dispatcher<M, L>,
    synchronizer: HandshakeSynchronizer<C>,
    retry_budget: u32,
    shutdown: ShutdownFlag,
}

impl<S, M, L> Session<S, M, L, SystemClock>
where
    S: LineSource,
    M: MetricsSink,
    L: LogSink,
{
    /// Create a session using the host clock
    pub fn new(source: S, dispatcher: Dispatcher<M, L>, shutdown: ShutdownFlag) -> Self {
        Self {
            source,
            dispatcher,
            synchronizer: HandshakeSynchronizer::new(),
            retry_budget: DEFAULT_RETRY_BUDGET,
            shutdown,
        }
    }
}

impl<S, M, L, C> Session<S, M, L, C>
where
    S: LineSource,
    M: MetricsSink,
    L: LogSink,
    C: Clock,
{
    /// Set the number of reads allowed while waiting for `READY`
    pub fn retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    /// Replace the wall clock
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Session<S, M, L, C2> {
        Session {
            source: self.source,
            dispatcher: self.dispatcher,
            synchronizer: HandshakeSynchronizer::with_clock(clock),
            retry_budget: self.retry_budget,
            shutdown: self.shutdown,
        }
    }

    /// Run the handshake, then forward samples until the link closes or shutdown is requested
    ///
    /// The source is closed on every exit path. A termination request is honoured
    /// during the handshake too and ends the session cleanly.
    ///
    /// # Errors
    /// Only a failed handshake is an error; sink and parse problems are logged and counted.
    #[instrument(name = "session_run", skip(self), fields(source = %self.source.name()))]
    pub async fn run(mut self) -> Result<SessionStats> {
        let started = Instant::now();
        let mut sequencer = SampleSequencer::new();
        let mut metrics = SessionMetricsAggregator::new();

        let shutdown = self.shutdown.clone();
        let state = match self
            .synchronizer
            .synchronize_until(&mut self.source, self.retry_budget, || {
                shutdown.is_requested()
            })
            .await
        {
            Ok(state) => {
                record_handshake(true);
                state
            }
            Err(SetupFailed::Interrupted { reads }) => {
                info!(reads, "Termination requested during handshake, stopping");
                return Ok(self.finish(&sequencer, started, true, metrics).await);
            }
            Err(e) => {
                record_handshake(false);
                error!(error = %e, "Handshake failed");
                self.close_source().await;
                return Err(e.into());
            }
        };

        let (metrics_sink, log_sink) = {
            let (m, l) = self.dispatcher.sink_names();
            (m.to_string(), l.to_string())
        };
        let mut shutdown_requested = false;

        while self.source.is_open() {
            if self.shutdown.is_requested() {
                info!("Termination requested, stopping");
                shutdown_requested = true;
                break;
            }

            let line = self.source.read_line().await;
            if line.is_empty() {
                trace!("Empty read");
                metrics.on_line(true);
                record_line_read(true);
                continue;
            }
            metrics.on_line(false);
            record_line_read(false);

            let sequence = sequencer.advance();
            let sample = parse_line(&line);

            match self.dispatcher.dispatch(&sample, &line, &state).await {
                DispatchOutcome::Skipped(reason) => {
                    metrics.on_dropped(reason.as_str());
                    record_sample_dropped(reason.as_str());
                }
                DispatchOutcome::Attempted { metrics: m, logs } => {
                    metrics.on_dispatched();
                    record_sample_dispatched(sequence);

                    if m == Delivery::Failed {
                        metrics.on_sink_failure(&metrics_sink);
                        record_sink_failure(&metrics_sink);
                    }
                    if logs == Delivery::Failed {
                        metrics.on_sink_failure(&log_sink);
                        record_sink_failure(&log_sink);
                    }

                    if let Some(lag) = device_lag_ms(&sample, &state, self.synchronizer.clock()) {
                        metrics.on_lag_ms(lag);
                        record_device_lag_ms(lag);
                    }
                }
            }
        }

        Ok(self
            .finish(&sequencer, started, shutdown_requested, metrics)
            .await)
    }

    async fn finish(
        mut self,
        sequencer: &SampleSequencer,
        started: Instant,
        shutdown_requested: bool,
        metrics: SessionMetricsAggregator,
    ) -> SessionStats {
        self.close_source().await;

        let stats = SessionStats {
            last_sequence: sequencer.current(),
            duration: started.elapsed(),
            shutdown_requested,
            sinks: self.dispatcher.metrics(),
            metrics,
        };

        info!(
            lines = stats.metrics.lines_read,
            dispatched = stats.samples_dispatched(),
            dropped = stats.samples_dropped(),
            "Session finished"
        );

        stats
    }

    async fn close_source(&mut self) {
        if let Err(e) = self.source.close().await {
            warn!(source = %self.source.name(), error = %e, "Failed to close source");
        }
    }
}

/// Host time minus the sample's translated instant
fn device_lag_ms(sample: &ParsedSample, state: &SyncState, clock: &impl Clock) -> Option<f64> {
    let millis = sample.device_millis().ok()??;
    let instant = translate(state, millis)?;
    let lag = clock.now().signed_duration_since(instant);
    Some(lag.num_microseconds()? as f64 / 1000.0)
}
