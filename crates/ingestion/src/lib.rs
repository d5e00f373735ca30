//! # Ingestion
//!
//! Device line ingestion module.
//!
//! Responsibilities:
//! - Open the serial link and read newline-terminated lines under a timeout
//! - Decode lines (ASCII, trailing whitespace stripped); failures become empty lines
//! - Parse `key:value` lines into `ParsedSample`
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{parse_line, SerialLineSource};
//! use contracts::LineSource;
//!
//! let mut source = SerialLineSource::open(&config.serial)?;
//! let line = source.read_line().await;
//! let sample = parse_line(&line);
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::MockLineSource;
//!
//! let source = MockLineSource::new(["READY", "temp:1,time:1000"]);
//! ```

mod error;
mod mock;
mod parser;
#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use contracts::{LineSource, ParsedSample};
pub use error::{IngestionError, Result};
pub use mock::{MockLineHandle, MockLineSource};
pub use parser::{decode_line, parse_line};
#[cfg(feature = "serial")]
pub use serial::SerialLineSource;
