//! Termination flag shared between signal handlers and the session loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

/// Set once, never cleared
///
/// Signal handlers only flip the flag; the session loop polls it before each read.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the session to stop after the current iteration
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Spawn Ctrl+C and SIGTERM listeners that set `flag`
///
/// Must be called from within a tokio runtime.
pub fn install_signal_handlers(flag: &ShutdownFlag) {
    let ctrl_c_flag = flag.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => ctrl_c_flag.request(),
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                let term_flag = flag.clone();
                tokio::spawn(async move {
                    if sigterm.recv().await.is_some() {
                        term_flag.request();
                    }
                });
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_shared_between_clones() {
        let flag = ShutdownFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_requested());

        handle.request();
        assert!(flag.is_requested());

        // Idempotent
        handle.request();
        assert!(flag.is_requested());
    }

    #[tokio::test]
    async fn test_install_does_not_set_flag() {
        let flag = ShutdownFlag::new();
        install_signal_handlers(&flag);
        tokio::task::yield_now().await;
        assert!(!flag.is_requested());
    }
}
