//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators (clock, public ledger, wallet provider, storage)
//! are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;
pub mod store;
pub mod wallet;

pub use clock::NullClock;
pub use ledger::NullLedgerClient;
pub use store::NullStore;
pub use wallet::{NullWalletProvider, SignBehavior};
