//! Wallet binding storage trait.

use crate::StoreError;
use selfproof_types::{OwnerId, WalletBinding, WalletType};

/// Trait for storing [`WalletBinding`]s, keyed by (owner, wallet type).
pub trait BindingStore: Send + Sync {
    /// Insert or replace the binding for its (owner, wallet type) pair.
    fn upsert(&self, binding: &WalletBinding) -> Result<(), StoreError>;

    /// Get the binding for a pair, active or not.
    fn get(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
    ) -> Result<Option<WalletBinding>, StoreError>;

    /// Every binding the owner ever connected, active or not.
    fn filter(&self, owner_id: &OwnerId) -> Result<Vec<WalletBinding>, StoreError>;
}
