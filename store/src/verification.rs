//! Verification record storage trait.

use crate::StoreError;
use selfproof_types::{OwnerId, RecordId, VerificationRecord, WalletType};
use serde::{Deserialize, Serialize};

/// Selects records by any combination of owner, wallet type and genesis flag.
/// An empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub owner_id: Option<OwnerId>,
    pub wallet_type: Option<WalletType>,
    pub is_genesis: Option<bool>,
}

impl RecordFilter {
    pub fn owner(owner_id: &OwnerId) -> Self {
        Self {
            owner_id: Some(owner_id.clone()),
            ..Self::default()
        }
    }

    pub fn wallet_type(mut self, wallet_type: WalletType) -> Self {
        self.wallet_type = Some(wallet_type);
        self
    }

    pub fn genesis(mut self, is_genesis: bool) -> Self {
        self.is_genesis = Some(is_genesis);
        self
    }

    pub fn matches(&self, record: &VerificationRecord) -> bool {
        self.owner_id.as_ref().map_or(true, |o| *o == record.owner_id)
            && self.wallet_type.map_or(true, |t| t == record.wallet_type)
            && self.is_genesis.map_or(true, |g| g == record.is_genesis)
    }
}

/// Append-only storage for [`VerificationRecord`]s.
///
/// Implementations must be safe to call from several threads. They do not
/// enforce DAG invariants; the trust ledger does that before calling `create`.
pub trait RecordStore: Send + Sync {
    /// Persist a new record. Fails with [`StoreError::Duplicate`] if the id exists.
    fn create(&self, record: &VerificationRecord) -> Result<(), StoreError>;

    /// Fetch one record by id.
    fn get(&self, id: &RecordId) -> Result<Option<VerificationRecord>, StoreError>;

    /// All records matching `filter`, in insertion order.
    fn filter(&self, filter: &RecordFilter) -> Result<Vec<VerificationRecord>, StoreError>;

    /// The current genesis record id for an (owner, wallet type) pair.
    fn genesis_pointer(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
    ) -> Result<Option<RecordId>, StoreError>;

    /// Point the (owner, wallet type) pair at a genesis record.
    fn set_genesis_pointer(
        &self,
        owner_id: &OwnerId,
        wallet_type: WalletType,
        id: &RecordId,
    ) -> Result<(), StoreError>;
}
