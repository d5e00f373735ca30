//! LineSource trait - device line stream abstraction
//!
//! Decouples the handshake and session loop from the concrete link, so the serial
//! port and scripted test sources share one interface.

use crate::ContractError;

/// Device line source
///
/// # Contract
///
/// `read_line` never fails: a timeout, a read error or an undecodable line all yield an
/// empty string, which callers treat as "no data this round". Trailing line terminators
/// are already stripped.
#[trait_variant::make(LineSource: Send)]
pub trait LocalLineSource {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Read the next decoded line, or an empty string
    async fn read_line(&mut self) -> String;

    /// Whether the underlying link can still produce lines
    fn is_open(&self) -> bool;

    /// Close the link
    async fn close(&mut self) -> Result<(), ContractError>;
}
