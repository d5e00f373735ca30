//! Serial port line source
//!
//! Reads newline-terminated ASCII lines from the microcontroller. Every read is bounded by
//! the configured timeout so the session loop can observe a shutdown request between
//! reads.

use std::time::Duration;

use contracts::{ContractError, LineSource, SerialConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{IngestionError, Result};
use crate::parser::decode_line;

/// Consecutive read errors after which the link is treated as gone
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 5;

/// Counts back-to-back read errors
#[derive(Debug, Clone, Copy)]
struct ReadErrorBackoff {
    consecutive: u32,
    limit: u32,
}

impl ReadErrorBackoff {
    fn new(limit: u32) -> Self {
        Self {
            consecutive: 0,
            limit,
        }
    }

    /// Record one error; returns true once the limit is reached
    fn record_error(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= self.limit
    }

    fn reset(&mut self) {
        self.consecutive = 0;
    }
}

/// Line source backed by a serial device
pub struct SerialLineSource {
    name: String,
    reader: Option<BufReader<SerialStream>>,
    read_timeout: Duration,
    /// Bytes of a line whose terminator has not arrived yet
    pending: Vec<u8>,
    errors: ReadErrorBackoff,
}

impl SerialLineSource {
    /// Open the serial device
    ///
    /// # Errors
    /// Returns `LinkUnavailable` if the device is missing or cannot be configured.
    #[instrument(name = "serial_source_open", skip(config), fields(port = %config.port))]
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = tokio_serial::new(&config.port, config.baud_rate)
            .timeout(config.read_timeout())
            .open_native_async()
            .map_err(|e| IngestionError::link_unavailable(&config.port, e.to_string()))?;

        info!(
            port = %config.port,
            baud_rate = config.baud_rate,
            read_timeout_ms = config.read_timeout_ms,
            "Serial port opened"
        );

        Ok(Self {
            name: config.port.clone(),
            reader: Some(BufReader::new(port)),
            read_timeout: config.read_timeout(),
            pending: Vec::new(),
            errors: ReadErrorBackoff::new(MAX_CONSECUTIVE_READ_ERRORS),
        })
    }

    fn take_line(&mut self) -> String {
        let bytes = std::mem::take(&mut self.pending);
        match decode_line(&bytes) {
            Ok(line) => line,
            Err(e) => {
                debug!(port = %self.name, error = %e, "Dropping undecodable line");
                String::new()
            }
        }
    }
}

impl LineSource for SerialLineSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_line(&mut self) -> String {
        let Some(reader) = self.reader.as_mut() else {
            return String::new();
        };

        // read_until appends whatever it consumed before a timeout, so a partial line
        // stays in `pending` and is completed by the next call.
        let read = tokio::time::timeout(self.read_timeout, reader.read_until(b'\n', &mut self.pending));

        match read.await {
            Err(_) => {
                trace!(port = %self.name, buffered = self.pending.len(), "Read timed out");
                String::new()
            }
            Ok(Ok(0)) => {
                warn!(port = %self.name, "Serial port closed unexpectedly");
                self.reader = None;
                self.take_line()
            }
            Ok(Ok(_)) => {
                self.errors.reset();
                self.take_line()
            }
            Ok(Err(e)) => {
                self.pending.clear();
                if self.errors.record_error() {
                    error!(
                        port = %self.name,
                        error = %e,
                        consecutive = self.errors.consecutive,
                        "Serial link keeps failing, giving up"
                    );
                    self.reader = None;
                } else {
                    warn!(port = %self.name, error = %e, "Serial read error");
                    // Wait out one read period instead of retrying straight away
                    tokio::time::sleep(self.read_timeout).await;
                }
                String::new()
            }
        }
    }

    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    async fn close(&mut self) -> std::result::Result<(), ContractError> {
        if self.reader.take().is_some() {
            info!(port = %self.name, "Serial port closed");
        }
        Ok(())
    }
}
