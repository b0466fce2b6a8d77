//! Shutdown coordination for graceful server shutdown.
//!
//! This module provides shared shutdown state so the application layer can
//! stop the accept loop and then wait for in-flight connections to wind down
//! before final cleanup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::info;

/// Shared shutdown state for coordinating graceful shutdown across components.
#[derive(Debug, Clone)]
pub struct ShutdownState {
    /// Set once shutdown begins; no new connections are accepted after this
    shutdown_initiated: Arc<AtomicBool>,
    /// Set once in-flight work has drained and final cleanup can begin
    shutdown_complete: Arc<AtomicBool>,
    /// Wakes tasks parked in [`ShutdownState::wait_for_initiation`]
    initiated: Arc<Notify>,
}

impl ShutdownState {
    /// Creates a new shutdown state with both flags set to false.
    pub fn new() -> Self {
        Self {
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_complete: Arc::new(AtomicBool::new(false)),
            initiated: Arc::new(Notify::new()),
        }
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Acquire)
    }

    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Acquire)
    }

    /// Initiates shutdown and wakes every waiter. Calling it twice is harmless.
    pub fn initiate_shutdown(&self) {
        if !self.shutdown_initiated.swap(true, Ordering::AcqRel) {
            info!("🛑 Shutdown initiated - no new connections will be accepted");
        }
        self.initiated.notify_waiters();
    }

    /// Marks shutdown as complete.
    pub fn complete_shutdown(&self) {
        self.shutdown_complete.store(true, Ordering::Release);
        info!("✅ Connections drained - ready for final cleanup");
    }

    /// Resolves once shutdown has been initiated.
    pub async fn wait_for_initiation(&self) {
        loop {
            let notified = self.initiated.notified();
            if self.is_shutdown_initiated() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_flags() {
        let state = ShutdownState::new();
        assert!(!state.is_shutdown_initiated());
        assert!(!state.is_shutdown_complete());

        let other = state.clone();
        other.initiate_shutdown();
        other.complete_shutdown();
        assert!(state.is_shutdown_initiated());
        assert!(state.is_shutdown_complete());
    }

    #[tokio::test]
    async fn test_waiters_are_woken() {
        let state = ShutdownState::new();
        let waiter = {
            let state = state.clone();
            tokio::spawn(async move { state.wait_for_initiation().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        state.initiate_shutdown();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .expect("waiter should not panic");

        // Already initiated: returns immediately.
        state.wait_for_initiation().await;
    }
}
