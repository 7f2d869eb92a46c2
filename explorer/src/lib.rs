//! Read-only access to confirmed transactions on the public ledger.
//!
//! The watcher only depends on [`LedgerQueryClient`]. Two implementations ship
//! here: [`ExplorerClient`] polls a block-explorer REST API, and
//! [`PushFeedClient`] serves transactions pushed by a subscription. Test
//! doubles live in `selfproof-nullables`.

pub mod client;
pub mod error;
pub mod http;
pub mod push;

pub use client::LedgerQueryClient;
pub use error::ExplorerError;
pub use http::{ExplorerClient, DEFAULT_EXPLORER_URL};
pub use push::{push_feed, PushFeedClient, PushFeedSender};
