//! Bridge session: handshake, steady-state loop, shutdown.

mod runner;
mod shutdown;
mod stats;

pub use runner::Session;
pub use shutdown::{install_signal_handlers, ShutdownFlag};
pub use stats::SessionStats;
