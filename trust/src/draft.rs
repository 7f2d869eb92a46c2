//! Unsealed records.

use selfproof_types::{OwnerId, RecordId, Timestamp, WalletAddress, WalletType};

/// Everything a caller knows about a new record before the ledger links it
/// into the DAG. [`crate::TrustLedger::seal`] fills in id, parents and metrics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordDraft {
    pub owner_id: OwnerId,
    pub wallet_address: WalletAddress,
    pub wallet_type: WalletType,
    pub message: String,
    pub signature: String,
    pub content_hash: String,
    pub is_genesis: bool,
    pub verified_by: Vec<RecordId>,
    pub created_at: Timestamp,
}
