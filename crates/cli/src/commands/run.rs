//! `run` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use contracts::BridgeConfig;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::session::{install_signal_handlers, SessionStats, ShutdownFlag};

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, args);
    config_loader::ConfigLoader::validate(&config).map_err(CliError::from)?;

    info!(
        port = %config.serial.port,
        baud_rate = config.serial.baud_rate,
        carbon = %config.metrics.address(),
        loki = %config.logs.url,
        retry_budget = config.handshake.retry_budget,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if let Some(port) = args.metrics_port.or(config.observability.metrics_port) {
        observability::init_metrics_only(port)?;
    }

    let shutdown = ShutdownFlag::new();
    install_signal_handlers(&shutdown);

    let stats = run_session(&config, args.console, shutdown)
        .await
        .context("Bridge session failed")?;

    stats.print_summary();
    info!("Telemetry bridge finished");
    Ok(())
}

/// Load configuration from `path`, or built-in defaults when none is given
pub fn load_config(path: Option<&Path>) -> crate::error::Result<BridgeConfig> {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        return Ok(BridgeConfig::default());
    };

    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }

    info!(config = %path.display(), "Loading configuration");
    Ok(config_loader::ConfigLoader::load_from_path(path)?)
}

fn apply_overrides(config: &mut BridgeConfig, args: &RunArgs) {
    if let Some(ref port) = args.port {
        info!(port = %port, "Overriding serial port from CLI");
        config.serial.port = port.clone();
    }
    if let Some(baud) = args.baud {
        info!(baud, "Overriding baud rate from CLI");
        config.serial.baud_rate = baud;
    }
    if let Some(budget) = args.retry_budget {
        info!(budget, "Overriding handshake retry budget from CLI");
        config.handshake.retry_budget = budget;
    }
}

#[cfg(feature = "serial")]
async fn run_session(
    config: &BridgeConfig,
    console: bool,
    shutdown: ShutdownFlag,
) -> crate::error::Result<SessionStats> {
    use crate::session::Session;
    use dispatcher::{create_dispatcher, ConsoleSink, Dispatcher};

    let source = ingestion::SerialLineSource::open(&config.serial)?;
    let retry_budget = config.handshake.retry_budget;

    if console {
        let dispatcher = Dispatcher::new(
            config.metrics.prefix.clone(),
            ConsoleSink::new("console-metrics"),
            ConsoleSink::new("console-logs"),
        );
        Session::new(source, dispatcher, shutdown)
            .retry_budget(retry_budget)
            .run()
            .await
    } else {
        let dispatcher = create_dispatcher(config)?;
        Session::new(source, dispatcher, shutdown)
            .retry_budget(retry_budget)
            .run()
            .await
    }
}

#[cfg(not(feature = "serial"))]
async fn run_session(
    _config: &BridgeConfig,
    _console: bool,
    _shutdown: ShutdownFlag,
) -> crate::error::Result<SessionStats> {
    Err(CliError::SerialDisabled)
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &BridgeConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Serial:");
    println!("  Port: {}", config.serial.port);
    println!("  Baud rate: {}", config.serial.baud_rate);
    println!("  Read timeout: {}ms", config.serial.read_timeout_ms);
    println!("\nHandshake:");
    println!("  Retry budget: {}", config.handshake.retry_budget);
    println!("\nCarbon:");
    println!("  Address: {}", config.metrics.address());
    println!("  Prefix: {}", config.metrics.prefix);
    println!("\nLoki:");
    println!("  URL: {}", config.logs.url);
    println!("  Source label: {}", config.logs.source);
    if let Some(port) = config.observability.metrics_port {
        println!("\nPrometheus exporter port: {}", port);
    }
    println!();
}
