//! Fundamental types for selfproof.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! owners, wallet addresses and bindings, amounts, timestamps, ledger transactions,
//! and the verification record that the trust ledger stores.

pub mod address;
pub mod amount;
pub mod error;
pub mod ids;
pub mod record;
pub mod time;
pub mod transaction;
pub mod wallet;

pub use address::WalletAddress;
pub use amount::Amount;
pub use error::TypesError;
pub use ids::{OwnerId, RecordId, TxId};
pub use record::VerificationRecord;
pub use time::{Clock, SystemClock, Timestamp};
pub use transaction::Transaction;
pub use wallet::{SigningCapability, WalletBinding, WalletType};
