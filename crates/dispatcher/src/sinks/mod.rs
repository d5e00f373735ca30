//! Sink implementations
//!
//! Contains CarbonSink, LokiSink and ConsoleSink, plus the pickle framing Carbon uses.

mod carbon;
mod log;
mod loki;
pub mod pickle;

pub use self::carbon::CarbonSink;
pub use self::log::ConsoleSink;
pub use self::loki::{LokiSink, PushRequest};
