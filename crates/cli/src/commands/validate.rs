//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::BridgeConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Handshakes with fewer allowed reads than this tend to miss `READY` behind boot noise
const MIN_COMFORTABLE_RETRY_BUDGET: u32 = 3;

/// Validation result for JSON output
#[derive(Debug, Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Debug, Serialize)]
struct ConfigSummary {
    version: String,
    serial_port: String,
    baud_rate: u32,
    retry_budget: u32,
    carbon: String,
    metric_prefix: String,
    loki: String,
    source_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_port: Option<u16>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    serial_port: config.serial.port.clone(),
                    baud_rate: config.serial.baud_rate,
                    retry_budget: config.handshake.retry_budget,
                    carbon: config.metrics.address(),
                    metric_prefix: config.metrics.prefix.clone(),
                    loki: config.logs.url.clone(),
                    source_label: config.logs.source.clone(),
                    metrics_port: config.observability.metrics_port,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &BridgeConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.handshake.retry_budget < MIN_COMFORTABLE_RETRY_BUDGET {
        warnings.push(format!(
            "handshake.retry_budget is {} - READY may be missed if the device prints a boot banner",
            config.handshake.retry_budget
        ));
    }

    if config.observability.metrics_port == Some(config.metrics.port) {
        warnings.push(format!(
            "observability.metrics_port {} equals the Carbon port",
            config.metrics.port
        ));
    }

    if config.logs.url.starts_with("http://") && !is_local(&config.logs.url) {
        warnings.push("logs.url uses plain http to a non-local host".to_string());
    }

    warnings
}

fn is_local(url: &str) -> bool {
    let rest = url
        .trim_start_matches("http://")
        .trim_start_matches("https://");
    rest.starts_with("localhost") || rest.starts_with("127.") || rest.starts_with("[::1]")
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Serial: {} @ {} baud", summary.serial_port, summary.baud_rate);
            println!("  Retry budget: {}", summary.retry_budget);
            println!("  Carbon: {} ({})", summary.carbon, summary.metric_prefix);
            println!("  Loki: {} (source={})", summary.loki, summary.source_label);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
