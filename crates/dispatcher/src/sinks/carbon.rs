//! CarbonSink - pickle batches over TCP
//!
//! One short-lived connection per batch: connect, write the framed payload, shut down.

use std::time::Duration;

use contracts::{ContractError, MetricPoint, MetricsSink, MetricsSinkConfig};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, instrument};

use super::pickle::frame_points;

/// Sink that ships metric batches to a Carbon pickle receiver
pub struct CarbonSink {
    name: String,
    addr: String,
    connect_timeout: Duration,
}

impl CarbonSink {
    /// Create a new CarbonSink
    ///
    /// Nothing is opened here; each batch gets its own connection.
    pub fn new(name: impl Into<String>, addr: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            addr: addr.into(),
            connect_timeout,
        }
    }

    /// Create from config section
    pub fn from_config(config: &MetricsSinkConfig) -> Self {
        Self::new("carbon", config.address(), config.connect_timeout())
    }

    /// Target `host:port`
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connect(&self) -> Result<TcpStream, ContractError> {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(ContractError::sink_unreachable(&self.name, e.to_string())),
            Err(_) => Err(ContractError::sink_unreachable(
                &self.name,
                format!(
                    "connect to {} timed out after {}ms",
                    self.addr,
                    self.connect_timeout.as_millis()
                ),
            )),
        }
    }
}

impl MetricsSink for CarbonSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "carbon_sink_send",
        skip(self, points),
        fields(sink = %self.name, points = points.len())
    )]
    async fn send_points(&mut self, points: &[MetricPoint]) -> Result<(), ContractError> {
        let message = frame_points(points).map_err(|e| ContractError::SinkEncode {
            sink_name: self.name.clone(),
            message: e.to_string(),
        })?;

        let mut stream = self.connect().await?;
        stream
            .write_all(&message)
            .await
            .map_err(|e| ContractError::sink_unreachable(&self.name, e.to_string()))?;
        stream
            .shutdown()
            .await
            .map_err(|e| ContractError::sink_unreachable(&self.name, e.to_string()))?;

        debug!(sink = %self.name, target = %self.addr, bytes = message.len(), "Sent");
        Ok(())
    }
}
