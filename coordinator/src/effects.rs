//! Side effects gated on a confirmed verification.

use selfproof_store::{ContentStore, PublishState, StoreError};
use selfproof_trust::{TrustError, WalletRegistry};
use selfproof_types::{OwnerId, VerificationRecord, WalletBinding};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EffectError {
    #[error("content {0} was already published")]
    AlreadyPublished(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("wallet registry error: {0}")]
    Registry(#[from] TrustError),
}

/// What a confirmed verification unlocks.
///
/// The coordinator calls these only after the record is in the trust ledger,
/// and at most once per record.
pub trait GatedEffects: Send + Sync {
    fn is_published(&self, content_id: &str) -> Result<bool, EffectError>;

    /// Flip the content's published flag.
    fn publish(
        &self,
        owner_id: &OwnerId,
        content_id: &str,
        record: &VerificationRecord,
    ) -> Result<(), EffectError>;

    /// Mark the binding's wallet as genesis-verified.
    fn mark_genesis_verified(
        &self,
        binding: &WalletBinding,
        record: &VerificationRecord,
    ) -> Result<(), EffectError>;
}

/// Writes effects through the content store and the wallet registry.
pub struct StoreEffects {
    content: Arc<dyn ContentStore>,
    registry: Arc<WalletRegistry>,
}

impl StoreEffects {
    pub fn new(content: Arc<dyn ContentStore>, registry: Arc<WalletRegistry>) -> Self {
        Self { content, registry }
    }
}

impl GatedEffects for StoreEffects {
    fn is_published(&self, content_id: &str) -> Result<bool, EffectError> {
        Ok(self.content.publish_state(content_id)?.is_some())
    }

    fn publish(
        &self,
        owner_id: &OwnerId,
        content_id: &str,
        record: &VerificationRecord,
    ) -> Result<(), EffectError> {
        let state = PublishState {
            content_id: content_id.to_string(),
            owner_id: owner_id.clone(),
            published_at: record.created_at,
            unlocked_by: record.id.clone(),
        };
        if !self.content.mark_published(&state)? {
            return Err(EffectError::AlreadyPublished(content_id.to_string()));
        }
        tracing::info!(owner = %owner_id, content = content_id, record = %record.id, "content published");
        Ok(())
    }

    fn mark_genesis_verified(
        &self,
        binding: &WalletBinding,
        record: &VerificationRecord,
    ) -> Result<(), EffectError> {
        self.registry
            .mark_genesis_verified(&binding.owner_id, binding.wallet_type, record.created_at)?;
        tracing::info!(
            owner = %binding.owner_id,
            wallet_type = %binding.wallet_type,
            record = %record.id,
            "wallet genesis-verified"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfproof_nullables::{NullClock, NullStore};
    use selfproof_types::{RecordId, Timestamp, WalletAddress, WalletType};

    fn record() -> VerificationRecord {
        VerificationRecord {
            id: RecordId::new("r1"),
            owner_id: OwnerId::new("u1"),
            wallet_address: WalletAddress::new("kaspa:abc"),
            wallet_type: WalletType::Extension,
            signature: String::new(),
            message: String::new(),
            parent_ids: Vec::new(),
            blue_score: 0,
            dag_depth: 0,
            is_genesis: true,
            verified_by: Vec::new(),
            created_at: Timestamp::from_secs(50),
            content_hash: String::new(),
        }
    }

    fn effects() -> (StoreEffects, Arc<WalletRegistry>) {
        let store = Arc::new(NullStore::new());
        let clock = Arc::new(NullClock::new(Timestamp::from_secs(10)));
        let registry = Arc::new(WalletRegistry::new(store.clone(), clock));
        (StoreEffects::new(store, registry.clone()), registry)
    }

    #[test]
    fn publish_applies_once() {
        let (effects, _) = effects();
        let owner = OwnerId::new("u1");
        assert!(!effects.is_published("post-1").unwrap());
        effects.publish(&owner, "post-1", &record()).unwrap();
        assert!(effects.is_published("post-1").unwrap());
        assert!(matches!(
            effects.publish(&owner, "post-1", &record()),
            Err(EffectError::AlreadyPublished(_))
        ));
    }

    #[test]
    fn genesis_mark_uses_record_time() {
        let (effects, registry) = effects();
        let owner = OwnerId::new("u1");
        let binding = registry
            .connect(&owner, WalletType::Extension, WalletAddress::new("kaspa:abc"))
            .unwrap();
        effects.mark_genesis_verified(&binding, &record()).unwrap();
        let stored = registry
            .active_binding(&owner, WalletType::Extension)
            .unwrap()
            .unwrap();
        assert_eq!(stored.genesis_verified_at, Some(Timestamp::from_secs(50)));
    }
}
