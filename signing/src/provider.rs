//! External wallet provider seam (browser extension or similar).

use async_trait::async_trait;
use selfproof_types::{Amount, TxId, WalletAddress};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request rejected by user")]
    Rejected,

    #[error("wallet provider unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

/// A wallet that holds keys on the user's behalf.
///
/// Only `request_accounts` and `sign_message` are used by the verification
/// core. `send_self_payment` is what a UI calls to create the transaction the
/// watcher later observes.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self) -> Result<Vec<WalletAddress>, ProviderError>;

    /// Sign `text` with the active account. Returns an opaque signature string.
    async fn sign_message(&self, text: &str) -> Result<String, ProviderError>;

    async fn send_self_payment(&self, amount: Amount) -> Result<TxId, ProviderError>;
}
