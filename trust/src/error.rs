use selfproof_store::StoreError;
use selfproof_types::{OwnerId, RecordId, WalletType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("record {record} has invalid parent {parent}: {reason}")]
    InvalidParentReference {
        record: RecordId,
        parent: RecordId,
        reason: &'static str,
    },

    #[error("record {record} names invalid verifier {verifier}: {reason}")]
    InvalidVerifierReference {
        record: RecordId,
        verifier: RecordId,
        reason: &'static str,
    },

    #[error("{owner} already has a genesis record for {wallet_type}")]
    DuplicateGenesis {
        owner: OwnerId,
        wallet_type: WalletType,
    },

    #[error("record {0} already exists")]
    DuplicateRecord(RecordId),

    #[error("record {0} content hash does not match its signature")]
    ContentHashMismatch(RecordId),

    #[error("{owner} has no {wallet_type} wallet connected")]
    UnknownBinding {
        owner: OwnerId,
        wallet_type: WalletType,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl TrustError {
    /// Data-integrity failures: the record was refused and must not be retried as-is.
    pub fn is_integrity_error(&self) -> bool {
        !matches!(self, TrustError::Store(_) | TrustError::UnknownBinding { .. })
    }
}
