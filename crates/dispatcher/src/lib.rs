//! # Dispatcher
//!
//! 数据分发模块。
//!
//! 负责：
//! - 把已解析的样本换算成墙钟时间
//! - 生成 Carbon 指标批次与 Loki 日志记录
//! - 每个 sink 独立尝试一次，失败互不影响

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod sinks;

pub use dispatcher::{
    build_payload, create_dispatcher, Delivery, DispatchOutcome, Dispatcher, Payload, SkipReason,
};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{pickle, CarbonSink, ConsoleSink, LokiSink, PushRequest};
