//! Mock 行数据源
//!
//! 用于无设备环境的测试：按顺序回放预先写好的行。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use contracts::{ContractError, LineSource};
use tracing::{debug, trace};

/// Scripted line source
///
/// Replays a fixed list of lines in order. Once drained (or closed) it reports itself
/// closed and yields empty lines, the same way a serial link behaves after EOF.
#[derive(Debug)]
pub struct MockLineSource {
    name: String,
    lines: VecDeque<String>,
    state: Arc<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    reads: AtomicUsize,
    closed: AtomicBool,
}

/// Observer for a [`MockLineSource`] that outlives the source
///
/// Sessions consume their source, so tests keep a handle to check what happened to it.
#[derive(Debug, Clone)]
pub struct MockLineHandle {
    state: Arc<MockState>,
}

impl MockLineHandle {
    /// Number of `read_line` calls so far
    pub fn reads(&self) -> usize {
        self.state.reads.load(Ordering::Relaxed)
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Relaxed)
    }
}

impl MockLineSource {
    /// Create source from lines
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: "mock".to_string(),
            lines: lines.into_iter().map(Into::into).collect(),
            state: Arc::default(),
        }
    }

    /// Override the source name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn handle(&self) -> MockLineHandle {
        MockLineHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Number of `read_line` calls so far
    pub fn reads(&self) -> usize {
        self.state.reads.load(Ordering::Relaxed)
    }

    /// Lines not consumed yet
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Relaxed)
    }
}

impl LineSource for MockLineSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_line(&mut self) -> String {
        if self.is_closed() {
            return String::new();
        }
        self.state.reads.fetch_add(1, Ordering::Relaxed);
        let line = self.lines.pop_front().unwrap_or_default();
        trace!(source = %self.name, line = %line, "Mock line");
        line
    }

    fn is_open(&self) -> bool {
        !self.is_closed() && !self.lines.is_empty()
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.state.closed.store(true, Ordering::Relaxed);
        debug!(source = %self.name, remaining = self.lines.len(), "Mock source closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let mut source = MockLineSource::new(["READY", "time:1"]);
        assert!(source.is_open());
        assert_eq!(source.read_line().await, "READY");
        assert_eq!(source.read_line().await, "time:1");
        assert!(!source.is_open());
        assert_eq!(source.read_line().await, "");
        assert_eq!(source.reads(), 3);
    }

    #[tokio::test]
    async fn test_mock_close() {
        let mut source = MockLineSource::new(["a", "b"]).with_name("bench");
        source.close().await.unwrap();
        assert!(source.is_closed());
        assert!(!source.is_open());
        assert_eq!(source.read_line().await, "");
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.name(), "bench");
    }

    #[tokio::test]
    async fn test_handle_outlives_source() {
        let mut source = MockLineSource::new(["a", "b"]);
        let handle = source.handle();

        source.read_line().await;
        source.close().await.unwrap();
        drop(source);

        assert_eq!(handle.reads(), 1);
        assert!(handle.is_closed());
    }
}
