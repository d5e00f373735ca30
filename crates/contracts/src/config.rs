//! BridgeConfig - Config Loader 输出
//!
//! 描述完整的桥接配置：串口、握手、指标输出、日志输出、可观测性。
//! 所有字段都有默认值，空配置文件即合法配置。

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的桥接配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 串口设置
    #[serde(default)]
    pub serial: SerialConfig,

    /// 握手设置
    #[serde(default)]
    pub handshake: HandshakeConfig,

    /// 时序数据库 (Carbon pickle 接收端)
    #[serde(default)]
    pub metrics: MetricsSinkConfig,

    /// 日志聚合 (Loki push API)
    #[serde(default)]
    pub logs: LogSinkConfig,

    /// 可观测性
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

/// 串口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// 设备路径 (e.g., "/dev/ttyACM0")
    #[serde(default = "default_serial_port")]
    pub port: String,

    /// 波特率
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// 单次读取超时 (毫秒)，同时决定关闭信号的响应延迟
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

fn default_serial_port() -> String {
    "/dev/ttyACM0".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_read_timeout_ms() -> u64 {
    5000
}

/// 握手配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeConfig {
    /// 等待 `READY` 的最大读取次数
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            retry_budget: default_retry_budget(),
        }
    }
}

fn default_retry_budget() -> u32 {
    30
}

/// Carbon 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSinkConfig {
    /// Carbon 主机
    #[serde(default = "default_carbon_host")]
    pub host: String,

    /// Carbon pickle 端口
    #[serde(default = "default_carbon_port")]
    pub port: u16,

    /// 指标路径前缀 (e.g., "arduino.fornello")
    #[serde(default = "default_metric_prefix")]
    pub prefix: String,

    /// 连接超时 (毫秒)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl MetricsSinkConfig {
    /// `host:port` 形式的地址
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for MetricsSinkConfig {
    fn default() -> Self {
        Self {
            host: default_carbon_host(),
            port: default_carbon_port(),
            prefix: default_metric_prefix(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

fn default_carbon_host() -> String {
    "localhost".to_string()
}

fn default_carbon_port() -> u16 {
    2004
}

fn default_metric_prefix() -> String {
    "arduino.fornello".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    2000
}

/// Loki 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSinkConfig {
    /// Push API 地址
    #[serde(default = "default_loki_url")]
    pub url: String,

    /// `source` 标签值
    #[serde(default = "default_log_source")]
    pub source: String,

    /// 请求超时 (毫秒)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl LogSinkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for LogSinkConfig {
    fn default() -> Self {
        Self {
            url: default_loki_url(),
            source: default_log_source(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_loki_url() -> String {
    "http://localhost:3100/loki/api/v1/push".to_string()
}

fn default_log_source() -> String {
    "serialport".to_string()
}

fn default_request_timeout_ms() -> u64 {
    2000
}

/// 可观测性配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    /// Prometheus 端口 (None = 禁用)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}
