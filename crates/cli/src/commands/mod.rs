//! Command implementations.

mod run;
mod validate;

pub use run::{load_config, run_bridge};
pub use validate::run_validate;
