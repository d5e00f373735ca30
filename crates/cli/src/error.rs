//! Error types for CLI operations.

use contracts::ContractError;
use dispatcher::DispatcherError;
use ingestion::IngestionError;
use sync_engine::SetupFailed;
use thiserror::Error;

/// CLI-specific error types
///
/// Every variant is fatal at startup; nothing in the steady-state loop produces one.
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parsing or validation error
    #[error("Invalid configuration: {0}")]
    Config(#[from] ContractError),

    /// Serial link could not be opened
    #[error("Serial link unavailable: {0}")]
    Link(#[from] IngestionError),

    /// Device handshake failed
    #[error("Handshake failed: {0}")]
    Handshake(#[from] SetupFailed),

    /// Sink construction failed
    #[error("Failed to create sinks: {0}")]
    Sinks(#[from] DispatcherError),

    /// Binary built without serial support
    #[error("Serial support is not compiled in (enable the `serial` feature)")]
    SerialDisabled,
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
