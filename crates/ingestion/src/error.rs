//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 串口无法打开
    #[error("failed to open serial port {port}: {message}")]
    LinkUnavailable {
        /// 设备路径
        port: String,
        /// 错误消息
        message: String,
    },

    /// 行解码失败 (非 ASCII)
    #[error("line is not ASCII: first invalid byte 0x{byte:02x} at offset {offset}")]
    Decode {
        /// 出错字节
        byte: u8,
        /// 字节偏移
        offset: usize,
    },
}

impl IngestionError {
    pub fn link_unavailable(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LinkUnavailable {
            port: port.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
