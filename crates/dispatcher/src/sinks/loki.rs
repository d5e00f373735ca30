//! LokiSink - pushes raw lines to a Loki push endpoint

use contracts::{ContractError, LogRecord, LogSink, LogSinkConfig};
use serde::Serialize;
use tracing::{debug, instrument};

/// Push API request body
#[derive(Debug, Serialize)]
pub struct PushRequest<'a> {
    pub streams: Vec<PushStream<'a>>,
}

/// One labelled stream
#[derive(Debug, Serialize)]
pub struct PushStream<'a> {
    pub stream: StreamLabels<'a>,
    /// `[epoch_nanos_as_string, line]` pairs
    pub values: Vec<[String; 2]>,
}

#[derive(Debug, Serialize)]
pub struct StreamLabels<'a> {
    pub source: &'a str,
}

impl<'a> PushRequest<'a> {
    /// Body carrying a single record under a `source` label
    pub fn single(source: &'a str, record: &LogRecord) -> Self {
        Self {
            streams: vec![PushStream {
                stream: StreamLabels { source },
                values: vec![[record.epoch_nanos.to_string(), record.line.clone()]],
            }],
        }
    }
}

/// Sink that sends each record as its own push request
pub struct LokiSink {
    name: String,
    url: String,
    source: String,
    client: reqwest::Client,
}

impl LokiSink {
    /// Create a new LokiSink
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built (TLS backend initialization).
    pub fn new(
        name: impl Into<String>,
        config: &LogSinkConfig,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ContractError::sink_unreachable(&name, e.to_string()))?;

        Ok(Self {
            name,
            url: config.url.clone(),
            source: config.source.clone(),
            client,
        })
    }

    /// Create from config section
    pub fn from_config(config: &LogSinkConfig) -> Result<Self, ContractError> {
        Self::new("loki", config)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl LogSink for LokiSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "loki_sink_send",
        skip(self, record),
        fields(sink = %self.name, epoch_nanos = record.epoch_nanos)
    )]
    async fn send_record(&mut self, record: &LogRecord) -> Result<(), ContractError> {
        let body = PushRequest::single(&self.source, record);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ContractError::sink_unreachable(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::SinkRejected {
                sink_name: self.name.clone(),
                status: status.as_u16(),
            });
        }

        debug!(sink = %self.name, status = status.as_u16(), "Pushed");
        Ok(())
    }
}
