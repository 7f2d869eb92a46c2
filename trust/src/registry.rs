//! Wallet bindings per owner.

use crate::TrustError;
use selfproof_store::BindingStore;
use selfproof_types::{Clock, OwnerId, Timestamp, WalletAddress, WalletBinding, WalletType};
use std::sync::Arc;

/// Connects owners to wallets, one binding per (owner, wallet type).
pub struct WalletRegistry {
    bindings: Arc<dyn BindingStore>,
    clock: Arc<dyn Clock>,
}

impl WalletRegistry {
    pub fn new(bindings: Arc<dyn BindingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { bindings, clock }
    }

    /// Connect a wallet, or reconnect one the owner connected before.
    ///
    /// Reconnecting the same address keeps its genesis verification.
    /// A different address starts unverified.
    pub fn connect(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
        address: WalletAddress,
    ) -> Result<WalletBinding, TrustError> {
        let now = self.clock.now();
        let binding = match self.bindings.get(owner_id, wallet_type)? {
            Some(mut existing) => {
                if existing.address != address {
                    tracing::info!(
                        owner = %owner_id,
                        %wallet_type,
                        from = %existing.address,
                        to = %address,
                        "wallet address changed"
                    );
                    existing.address = address;
                    existing.genesis_verified_at = None;
                }
                existing.active = true;
                existing.connected_at = now;
                existing
            }
            None => WalletBinding::new(owner_id.clone(), wallet_type, address, now),
        };
        self.bindings.upsert(&binding)?;
        tracing::debug!(owner = %owner_id, %wallet_type, address = %binding.address, "wallet connected");
        Ok(binding)
    }

    /// Hide the binding from the owner's view. The binding itself is kept.
    pub fn disconnect(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
    ) -> Result<(), TrustError> {
        let mut binding = self.require(owner_id, wallet_type)?;
        if binding.active {
            binding.active = false;
            self.bindings.upsert(&binding)?;
            tracing::debug!(owner = %owner_id, %wallet_type, "wallet disconnected");
        }
        Ok(())
    }

    /// The owner's connected wallets.
    pub fn active_bindings(&self, owner_id: &OwnerId) -> Result<Vec<WalletBinding>, TrustError> {
        Ok(self
            .bindings
            .filter(owner_id)?
            .into_iter()
            .filter(|b| b.active)
            .collect())
    }

    pub fn active_binding(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
    ) -> Result<Option<WalletBinding>, TrustError> {
        Ok(self
            .bindings
            .get(owner_id, wallet_type)?
            .filter(|b| b.active))
    }

    /// Record a confirmed genesis verification. Only the first one sticks.
    pub fn mark_genesis_verified(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
        at: Timestamp,
    ) -> Result<WalletBinding, TrustError> {
        let mut binding = self.require(owner_id, wallet_type)?;
        if binding.genesis_verified_at.is_none() {
            binding.genesis_verified_at = Some(at);
            self.bindings.upsert(&binding)?;
        }
        Ok(binding)
    }

    fn require(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
    ) -> Result<WalletBinding, TrustError> {
        self.bindings
            .get(owner_id, wallet_type)?
            .ok_or_else(|| TrustError::UnknownBinding {
                owner: owner_id.clone(),
                wallet_type,
            })
    }
}
