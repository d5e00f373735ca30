//! Diagnostic sample counter

/// Counts lines processed after synchronization
///
/// Starts at -1 so the first synchronized line is sample 0. Observability only; nothing
/// downstream depends on the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSequencer {
    current: i64,
}

impl SampleSequencer {
    pub fn new() -> Self {
        Self { current: -1 }
    }

    /// Advance by one and return the new sample number
    pub fn advance(&mut self) -> i64 {
        self.current += 1;
        self.current
    }

    /// Last sample number handed out (-1 before the first)
    pub fn current(&self) -> i64 {
        self.current
    }
}

impl Default for SampleSequencer {
    fn default() -> Self {
        Self::new()
    }
}
