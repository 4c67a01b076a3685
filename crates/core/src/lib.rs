//! Quiesce Core - debounce primitives
//!
//! This crate provides:
//! - `Debounced<T>`: a value holder that only advances after its input
//!   has been stable for a quiescence window
//! - `KeyedDebouncer<K, V>`: the same policy applied independently per key
//! - `PendingTimer`: a cancellable scheduled callback on the tokio runtime
//! - `DebounceConfig`: serializable delay settings

pub mod config;
pub mod error;
pub mod holder;
pub mod keyed;
pub mod timer;

// Re-export main types for convenience
pub use config::{ConfigError, DebounceConfig};
pub use error::DebounceError;
pub use holder::Debounced;
pub use keyed::{KeyedDebouncer, Settled};
pub use timer::PendingTimer;

/// Result type for debounce operations
pub type Result<T> = std::result::Result<T, DebounceError>;
