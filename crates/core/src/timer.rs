//! Cancellable scheduled callbacks
//!
//! A `PendingTimer` owns one deferred action running on the current tokio
//! runtime. Cancelling or dropping the timer aborts the action if it has
//! not run yet.

use crate::{DebounceError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

/// A deferred action scheduled on the tokio runtime
#[derive(Debug)]
pub struct PendingTimer {
    /// Schedule number, used by the action to check it is still current
    generation: u64,
    /// Task driving the sleep + action (None once cancelled or detached)
    handle: Option<JoinHandle<()>>,
}

impl PendingTimer {
    /// Schedule `action` to run after `delay`
    ///
    /// Fails with `NoRuntime` when called outside a tokio runtime.
    pub fn schedule<F>(generation: u64, delay: Duration, action: F) -> Result<Self>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| DebounceError::NoRuntime)?;

        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });

        trace!(generation, ?delay, "Scheduled pending timer");

        Ok(Self {
            generation,
            handle: Some(handle),
        })
    }

    /// Schedule number this timer was created with
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the action has not yet finished and was not cancelled
    #[cfg(test)]
    fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Abort the action if it has not run yet
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            trace!(generation = self.generation, "Cancelled pending timer");
        }
    }

    /// Release the slot without aborting the task
    ///
    /// Called by a firing action that clears its own slot; aborting there
    /// would cancel the action at its next await point.
    pub fn detach(mut self) {
        self.handle.take();
    }
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let timer = PendingTimer::schedule(1, Duration::from_millis(100), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(timer.is_armed());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
        assert_eq!(timer.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_action() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let mut timer = PendingTimer::schedule(7, Duration::from_millis(100), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        timer.cancel();
        assert!(!timer.is_armed());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let timer = PendingTimer::schedule(1, Duration::from_millis(10), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        drop(timer);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detach_lets_action_run() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let timer = PendingTimer::schedule(1, Duration::from_millis(10), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        timer.detach();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_schedule_outside_runtime() {
        let result = PendingTimer::schedule(1, Duration::from_millis(10), async {});
        assert_eq!(result.unwrap_err(), DebounceError::NoRuntime);
    }
}
