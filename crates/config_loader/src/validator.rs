//! 配置校验模块
//!
//! 校验规则：
//! - 串口路径非空，波特率与读取超时 > 0
//! - retry_budget >= 1
//! - 指标前缀非空且不以 '.' 结尾
//! - Loki URL 为 http(s)，source 标签非空

use contracts::{BridgeConfig, ContractError};

/// 校验 BridgeConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &BridgeConfig) -> Result<(), ContractError> {
    validate_serial(config)?;
    validate_handshake(config)?;
    validate_metrics(config)?;
    validate_logs(config)?;
    Ok(())
}

/// 校验串口配置
fn validate_serial(config: &BridgeConfig) -> Result<(), ContractError> {
    let serial = &config.serial;

    if serial.port.trim().is_empty() {
        return Err(ContractError::config_validation(
            "serial.port",
            "serial port path cannot be empty",
        ));
    }
    if serial.baud_rate == 0 {
        return Err(ContractError::config_validation(
            "serial.baud_rate",
            "baud_rate must be > 0",
        ));
    }
    if serial.read_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "serial.read_timeout_ms",
            "read_timeout_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验握手配置
fn validate_handshake(config: &BridgeConfig) -> Result<(), ContractError> {
    if config.handshake.retry_budget == 0 {
        return Err(ContractError::config_validation(
            "handshake.retry_budget",
            "retry_budget must be >= 1",
        ));
    }
    Ok(())
}

/// 校验 Carbon 配置
fn validate_metrics(config: &BridgeConfig) -> Result<(), ContractError> {
    let metrics = &config.metrics;

    if metrics.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "metrics.host",
            "carbon host cannot be empty",
        ));
    }
    if metrics.prefix.is_empty() {
        return Err(ContractError::config_validation(
            "metrics.prefix",
            "metric prefix cannot be empty",
        ));
    }
    if metrics.prefix.ends_with('.') || metrics.prefix.contains(char::is_whitespace) {
        return Err(ContractError::config_validation(
            "metrics.prefix",
            format!(
                "metric prefix '{}' must not end with '.' or contain whitespace",
                metrics.prefix
            ),
        ));
    }
    Ok(())
}

/// 校验 Loki 配置
fn validate_logs(config: &BridgeConfig) -> Result<(), ContractError> {
    let logs = &config.logs;

    if !(logs.url.starts_with("http://") || logs.url.starts_with("https://")) {
        return Err(ContractError::config_validation(
            "logs.url",
            format!("url '{}' must start with http:// or https://", logs.url),
        ));
    }
    if logs.source.trim().is_empty() {
        return Err(ContractError::config_validation(
            "logs.source",
            "source label cannot be empty",
        ));
    }
    Ok(())
}
