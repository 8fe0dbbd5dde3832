//! Settle-delay scheduling for automatic shares.
//!
//! Tab events fire while dynamic page content is still rendering, so an
//! automatic share runs only after a settle delay. Scheduling is explicit
//! and cancellable: a new trigger replaces the pending task, so a burst of
//! events collapses into one delayed share.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Debounced task scheduler with a cancellable handle.
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `task` to run after the settle delay, cancelling any task
    /// still pending.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("Replacing pending scheduled share");
            }
            handle.abort();
        }

        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Cancel the pending task, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
