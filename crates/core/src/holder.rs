//! Debounced value holder
//!
//! `Debounced<T>` keeps a stable copy of a rapidly changing input. Every
//! `observe` cancels the outstanding timer and schedules a new one, so only
//! a period of silence at least as long as the quiescence window moves the
//! held value forward.

use crate::config::DebounceConfig;
use crate::timer::PendingTimer;
use crate::{DebounceError, Result};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tracing::{debug, trace};

/// Handle to a debounced value
///
/// Clones share the same instance. Disposing through any clone disposes
/// all of them; dropping the last clone cancels the pending timer.
pub struct Debounced<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    /// Mutable bookkeeping, guarded together so cancellation is race-free
    state: Mutex<State<T>>,
    /// Held value; also the publisher for `subscribe`
    held: watch::Sender<T>,
    /// Woken whenever the pending timer slot empties
    settled: Notify,
}

struct State<T> {
    disposed: bool,
    /// Last generation handed out to a timer
    generation: u64,
    /// Input waiting for its quiescence window to elapse
    pending_input: Option<T>,
    /// Window of the most recent observation
    window: Option<Duration>,
    /// At most one outstanding timer
    timer: Option<PendingTimer>,
}

impl<T> Clone for Debounced<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Debounced<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Debounced")
            .field("disposed", &state.disposed)
            .field("generation", &state.generation)
            .field("pending", &state.timer.is_some())
            .field("window", &state.window)
            .finish()
    }
}

impl<T> Debounced<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a holder whose held value starts at `initial`
    ///
    /// No timer is scheduled until the first `observe`.
    pub fn new(initial: T) -> Self {
        let (held, _) = watch::channel(initial);

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    disposed: false,
                    generation: 0,
                    pending_input: None,
                    window: None,
                    timer: None,
                }),
                held,
                settled: Notify::new(),
            }),
        }
    }

    /// Record a new input and restart the quiescence window
    ///
    /// If no further `observe` arrives within `delay`, the held value
    /// becomes `value`. Must be called from within a tokio runtime.
    pub fn observe(&self, value: T, delay: Duration) -> Result<()> {
        let mut state = self.inner.live_state()?;

        state.generation += 1;
        let generation = state.generation;

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        let committed = value.clone();
        let timer = PendingTimer::schedule(generation, delay, async move {
            if let Some(inner) = weak.upgrade() {
                inner.commit(generation, committed);
            }
        })?;

        if let Some(mut previous) = state.timer.replace(timer) {
            previous.cancel();
        }
        state.pending_input = Some(value);
        state.window = Some(delay);

        Ok(())
    }

    /// Observe using the delay from a config block
    pub fn observe_with(&self, value: T, config: &DebounceConfig) -> Result<()> {
        self.observe(value, config.delay())
    }

    /// Current held value
    pub fn read(&self) -> Result<T> {
        let _state = self.inner.live_state()?;
        Ok(self.inner.held.borrow().clone())
    }

    /// Set the held value immediately, bypassing the quiescence window
    ///
    /// A pending timer is left in place and still commits its input when
    /// it fires.
    pub fn override_value(&self, value: T) -> Result<()> {
        let state = self.inner.live_state()?;
        self.inner.held.send_replace(value);
        debug!(pending = state.timer.is_some(), "Overrode debounced value");
        Ok(())
    }

    /// Set the held value from the current one, bypassing the window
    ///
    /// Same timer interaction as `override_value`.
    pub fn update_with<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(&T) -> T,
    {
        let state = self.inner.live_state()?;
        let next = {
            let current = self.inner.held.borrow();
            update(&current)
        };
        self.inner.held.send_replace(next);
        debug!(pending = state.timer.is_some(), "Updated debounced value");
        Ok(())
    }

    /// Cancel the pending timer and retire the instance
    pub fn dispose(&self) -> Result<()> {
        {
            let mut state = self.inner.live_state()?;
            state.disposed = true;
            state.pending_input = None;
            if let Some(mut timer) = state.timer.take() {
                timer.cancel();
            }
        }

        debug!("Disposed debounced value");
        self.inner.settled.notify_waiters();
        Ok(())
    }

    /// Input waiting to be committed, if a timer is outstanding
    pub fn pending_input(&self) -> Result<Option<T>> {
        Ok(self.inner.live_state()?.pending_input.clone())
    }

    /// Quiescence window of the most recent observation
    pub fn quiescence_window(&self) -> Result<Option<Duration>> {
        Ok(self.inner.live_state()?.window)
    }

    /// Whether a timer is outstanding
    pub fn is_pending(&self) -> Result<bool> {
        Ok(self.inner.live_state()?.timer.is_some())
    }

    /// Receiver that sees every commit and override
    pub fn subscribe(&self) -> Result<watch::Receiver<T>> {
        let _state = self.inner.live_state()?;
        Ok(self.inner.held.subscribe())
    }

    /// Wait until no timer is outstanding, then return the held value
    ///
    /// Fails with `Disposed` if the instance is disposed while waiting.
    pub async fn settled(&self) -> Result<T> {
        loop {
            let notified = self.inner.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.inner.live_state()?;
                if state.timer.is_none() {
                    return Ok(self.inner.held.borrow().clone());
                }
            }

            notified.await;
        }
    }
}

impl<T> Inner<T> {
    fn live_state(&self) -> Result<MutexGuard<'_, State<T>>> {
        let state = self.state.lock();
        if state.disposed {
            return Err(DebounceError::Disposed);
        }
        Ok(state)
    }

    /// Called by a timer once its window elapsed
    fn commit(&self, generation: u64, value: T) {
        let mut state = self.state.lock();

        // Superseded or cancelled between wake-up and lock
        let current = state.timer.as_ref().map(PendingTimer::generation);
        if state.disposed || current != Some(generation) {
            trace!(generation, ?current, "Dropped stale timer firing");
            return;
        }

        if let Some(timer) = state.timer.take() {
            timer.detach();
        }
        state.pending_input = None;
        self.held.send_replace(value);
        drop(state);

        debug!(generation, "Committed debounced value");
        self.settled.notify_waiters();
    }
}
