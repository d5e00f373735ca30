//! # Sync Engine
//!
//! Device-time synchronization.
//!
//! 负责：
//! - `READY` 握手，建立设备时间到墙钟时间的映射 (`SyncState`)
//! - 设备毫秒计数 -> 墙钟时间的线性转换
//! - 同步后的样本计数
//!
//! ## 使用示例
//!
//! ```ignore
//! use sync_engine::{translate, HandshakeSynchronizer};
//!
//! let sync = HandshakeSynchronizer::new()
//!     .synchronize(&mut source, config.handshake.retry_budget)
//!     .await?;
//!
//! let wall = translate(&sync, device_millis);
//! ```

mod clock;
mod handshake;
mod sequencer;

// Re-exports
pub use clock::{epoch_nanos, epoch_seconds, translate, Clock, FixedClock, SystemClock};
pub use handshake::{HandshakeState, HandshakeSynchronizer, SetupFailed};
pub use sequencer::SampleSequencer;

// Re-export contracts types
pub use contracts::{SyncState, READY_TOKEN};
