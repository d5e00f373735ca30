//! # Contracts
//!
//! Frozen interface contracts shared by every bridge crate: line/sample data structures,
//! the handshake output (`SyncState`), sink payloads, the source/sink traits and the
//! configuration schema. Business crates depend on this crate only, never on each other's
//! internals.
//!
//! ## Time Model
//! - The device reports a boot-relative millisecond counter under the `time` key
//! - Wall-clock instants are `chrono::DateTime<Utc>`
//! - The mapping between the two is fixed once, at handshake time

mod config;
mod error;
mod sample;
mod sink;
mod source;
mod sync;

pub use config::*;
pub use error::*;
pub use sample::*;
pub use sink::*;
pub use source::{LineSource, LocalLineSource};
pub use sync::*;
