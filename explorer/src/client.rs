//! The ledger query seam.

use crate::ExplorerError;
use async_trait::async_trait;
use selfproof_types::{Transaction, WalletAddress};
use std::sync::Arc;

/// Reads recent confirmed transactions touching an address.
///
/// The result is an untrusted, eventually-consistent view: callers must not
/// assume any ordering, and a transaction missing now may appear on a later
/// call. Polling and push-based sources both satisfy this contract.
#[async_trait]
pub trait LedgerQueryClient: Send + Sync {
    /// Up to `limit` recent transactions involving `address`.
    async fn fetch_recent_transactions(
        &self,
        address: &WalletAddress,
        limit: usize,
    ) -> Result<Vec<Transaction>, ExplorerError>;
}

#[async_trait]
impl<T: LedgerQueryClient + ?Sized> LedgerQueryClient for Arc<T> {
    async fn fetch_recent_transactions(
        &self,
        address: &WalletAddress,
        limit: usize,
    ) -> Result<Vec<Transaction>, ExplorerError> {
        (**self).fetch_recent_transactions(address, limit).await
    }
}
