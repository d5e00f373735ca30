//! Layered error definitions
//!
//! Categorized by source: config / sample / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sample Errors =====
    /// A value that should be numeric is not
    #[error("malformed value for '{key}': {value:?}")]
    MalformedValue { key: String, value: String },

    // ===== Sink Errors =====
    /// Transport failure reaching a sink
    #[error("sink '{sink_name}' unreachable: {message}")]
    SinkUnreachable { sink_name: String, message: String },

    /// Sink answered, but refused the payload
    #[error("sink '{sink_name}' rejected payload with status {status}")]
    SinkRejected { sink_name: String, status: u16 },

    /// Payload could not be encoded for the wire
    #[error("sink '{sink_name}' encode error: {message}")]
    SinkEncode { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create malformed value error
    pub fn malformed_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedValue {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create sink unreachable error
    pub fn sink_unreachable(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkUnreachable {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error originates from a sink (non-fatal by policy)
    pub fn is_sink_error(&self) -> bool {
        matches!(
            self,
            Self::SinkUnreachable { .. } | Self::SinkRejected { .. } | Self::SinkEncode { .. }
        )
    }
}
