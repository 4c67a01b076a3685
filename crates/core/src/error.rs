//! Usage errors surfaced by debounce handles

use thiserror::Error;

/// Errors returned by `Debounced` and `KeyedDebouncer` operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DebounceError {
    /// The instance was disposed; the handle can no longer be used
    #[error("debounce handle used after dispose")]
    Disposed,

    /// A timer was requested outside of a tokio runtime
    #[error("no tokio runtime available to schedule the pending timer")]
    NoRuntime,
}
