//! Per-key debouncing
//!
//! Each key gets its own pending timer. Rapid updates to one key collapse
//! into a single `Settled` event, while other keys settle on their own
//! schedule. Settled values are delivered on an mpsc channel.

use crate::timer::PendingTimer;
use crate::{DebounceError, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// A value that survived its quiescence window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<K, V> {
    pub key: K,
    pub value: V,
}

/// Debouncer keeping one pending timer per key
pub struct KeyedDebouncer<K, V>
where
    K: Eq + Hash,
{
    inner: Arc<KeyedInner<K, V>>,
}

struct KeyedInner<K, V>
where
    K: Eq + Hash,
{
    /// Default quiescence window
    delay: Duration,
    /// Outstanding timer per key
    timers: DashMap<K, PendingTimer>,
    /// Monotonic schedule counter shared by all keys
    generation: AtomicU64,
    disposed: AtomicBool,
    /// Sender for settled values
    settled_tx: mpsc::Sender<Settled<K, V>>,
}

impl<K, V> Clone for KeyedDebouncer<K, V>
where
    K: Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> KeyedDebouncer<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + 'static,
{
    /// Create a debouncer with a default window, delivering to `settled_tx`
    pub fn new(delay: Duration, settled_tx: mpsc::Sender<Settled<K, V>>) -> Self {
        Self {
            inner: Arc::new(KeyedInner {
                delay,
                timers: DashMap::new(),
                generation: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
                settled_tx,
            }),
        }
    }

    /// Default quiescence window
    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Record a new value for `key` using the default window
    pub fn observe(&self, key: K, value: V) -> Result<()> {
        self.observe_with_delay(key, value, self.inner.delay)
    }

    /// Record a new value for `key`, restarting its window at `delay`
    pub fn observe_with_delay(&self, key: K, value: V, delay: Duration) -> Result<()> {
        self.ensure_live()?;

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let weak: Weak<KeyedInner<K, V>> = Arc::downgrade(&self.inner);
        let task_key = key.clone();

        // Shard stays locked until the new timer is in place
        let entry = self.inner.timers.entry(key);
        let timer = PendingTimer::schedule(generation, delay, async move {
            if let Some(inner) = weak.upgrade() {
                inner.fire(task_key, generation, value).await;
            }
        })?;

        match entry {
            Entry::Occupied(mut occupied) => {
                let mut previous = occupied.insert(timer);
                previous.cancel();
            }
            Entry::Vacant(vacant) => {
                vacant.insert(timer);
            }
        }

        // Lost a race with dispose
        if self.inner.disposed.load(Ordering::SeqCst) {
            self.inner.timers.clear();
            return Err(DebounceError::Disposed);
        }

        Ok(())
    }

    /// Drop the pending value for `key`
    ///
    /// Returns whether a value was pending.
    pub fn cancel(&self, key: &K) -> Result<bool> {
        self.ensure_live()?;

        match self.inner.timers.remove(key) {
            Some((_, mut timer)) => {
                timer.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether `key` has a value waiting to settle
    pub fn is_pending(&self, key: &K) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.inner.timers.contains_key(key))
    }

    /// Number of keys with a value waiting to settle
    pub fn pending_count(&self) -> Result<usize> {
        self.ensure_live()?;
        Ok(self.inner.timers.len())
    }

    /// Cancel every pending timer and retire the debouncer
    pub fn dispose(&self) -> Result<()> {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return Err(DebounceError::Disposed);
        }

        let cancelled = self.inner.timers.len();
        self.inner.timers.clear();
        debug!(cancelled, "Disposed keyed debouncer");
        Ok(())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(DebounceError::Disposed);
        }
        Ok(())
    }
}

impl<K, V> KeyedInner<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Called by a key's timer once its window elapsed
    ///
    /// The key's entry stays in the map until the value is handed to the
    /// channel, so a delivery blocked on a full channel still counts as
    /// pending and is aborted by `cancel`, a newer `observe` or `dispose`.
    async fn fire(&self, key: K, generation: u64, value: V) {
        // Only the most recent timer for the key may deliver
        let current = self.timers.get(&key).map(|timer| timer.generation());
        if current != Some(generation) || self.disposed.load(Ordering::SeqCst) {
            trace!(generation, ?current, "Dropped stale keyed timer firing");
            return;
        }

        let settled = Settled { key: key.clone(), value };
        if self.settled_tx.send(settled).await.is_err() {
            warn!(generation, "Settled receiver closed, dropping value");
        } else {
            trace!(generation, "Delivered settled value");
        }

        if let Some((_, timer)) = self.timers.remove_if(&key, |_, timer| timer.generation() == generation) {
            timer.detach();
        }
    }
}
