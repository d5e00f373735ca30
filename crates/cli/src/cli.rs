//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Telemetry Bridge - forwards microcontroller serial telemetry to Carbon and Loki
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-bridge",
    author,
    version,
    about = "Serial telemetry bridge for Carbon and Loki",
    long_about = "Reads `key:value` telemetry lines from a microcontroller over a serial link.\n\n\
                  Waits for the device's READY handshake, maps its millisecond counter onto \n\
                  wall-clock time, then ships every sample to a Carbon pickle receiver and \n\
                  a Loki push endpoint."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "TELEMETRY_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bridge until the link closes or a termination signal arrives
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "TELEMETRY_BRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override serial device path
    #[arg(long, env = "TELEMETRY_BRIDGE_PORT")]
    pub port: Option<String>,

    /// Override serial baud rate
    #[arg(long, env = "TELEMETRY_BRIDGE_BAUD")]
    pub baud: Option<u32>,

    /// Override the number of reads allowed while waiting for READY
    #[arg(long, env = "TELEMETRY_BRIDGE_RETRY_BUDGET")]
    pub retry_budget: Option<u32>,

    /// Prometheus exporter port (overrides `observability.metrics_port`)
    #[arg(long, env = "TELEMETRY_BRIDGE_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Log samples to the console instead of sending them to Carbon and Loki
    #[arg(long)]
    pub console: bool,

    /// Validate configuration and exit without opening the serial link
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "telemetry-bridge.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
