//! Self-payment verification watcher.
//!
//! Given an address, an expected amount and a not-before timestamp, a watch
//! polls the public ledger until it observes a payment from the address to
//! itself, runs out of attempts, or is cancelled. Exactly one terminal callback
//! fires per watch, and none fires once [`WatchHandle::cancel`] has returned.

pub mod config;
pub mod error;
pub mod handle;
pub mod matcher;
pub mod watcher;

pub use config::WatchConfig;
pub use error::WatchError;
pub use handle::{WatchCanceller, WatchHandle, WatchId, WatchState};
pub use matcher::{is_match, select_match};
pub use watcher::{VerificationWatcher, WatchCallbacks, WatchOutcome, WatchRequest};
