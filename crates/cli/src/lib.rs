//! # Telemetry Bridge CLI
//!
//! 命令行接口与会话编排。
//!
//! 提供：
//! - 配置加载、覆盖与验证
//! - 握手 + 稳态循环的会话驱动
//! - 优雅关闭处理

pub mod cli;
pub mod commands;
pub mod error;
pub mod session;

pub use error::{CliError, Result};
pub use session::{install_signal_handlers, Session, SessionStats, ShutdownFlag};
