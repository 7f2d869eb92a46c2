//! The node type stored by the trust ledger.

use crate::{OwnerId, RecordId, Timestamp, WalletAddress, WalletType};
use serde::{Deserialize, Serialize};

/// Length in hex characters of [`VerificationRecord::content_hash`].
pub const CONTENT_HASH_LEN: usize = 64;

/// A signed proof that `owner_id` controlled `wallet_address` at `created_at`.
///
/// Records are immutable once appended to the trust ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: RecordId,
    pub owner_id: OwnerId,
    pub wallet_address: WalletAddress,
    pub wallet_type: WalletType,
    pub signature: String,
    pub message: String,
    pub parent_ids: Vec<RecordId>,
    pub blue_score: u64,
    pub dag_depth: u64,
    pub is_genesis: bool,
    pub verified_by: Vec<RecordId>,
    pub created_at: Timestamp,
    /// `signature[0..64]`. A local tamper-evidence tag, not a chain proof.
    pub content_hash: String,
}

impl VerificationRecord {
    pub fn is_cross_verified(&self) -> bool {
        !self.verified_by.is_empty()
    }
}
