use selfproof_signing::SigningError;
use selfproof_trust::TrustError;
use selfproof_types::{OwnerId, WalletType};
use selfproof_watcher::WatchError;
use thiserror::Error;

use crate::{ConfigError, EffectError, FlowKey};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Another flow for the same (owner, action) has not finished yet.
    #[error("a verification for {0} is already in progress")]
    AlreadyInProgress(FlowKey),

    #[error("{owner} has no active {wallet_type} wallet")]
    NoBinding {
        owner: OwnerId,
        wallet_type: WalletType,
    },

    #[error("content {0} is already published")]
    AlreadyPublished(String),

    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),

    /// The ledger kept failing or refused the query.
    #[error("watch failed: {0}")]
    Watch(#[from] WatchError),

    #[error("trust ledger error: {0}")]
    Trust(#[from] TrustError),

    /// The record was appended but the gated side effect could not be applied.
    #[error("side effect failed: {0}")]
    SideEffect(#[from] EffectError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl CoordinatorError {
    /// Whether starting the same flow again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoordinatorError::AlreadyInProgress(_)
            | CoordinatorError::Watch(_) => true,
            CoordinatorError::Signing(e) => e.is_user_correctable(),
            CoordinatorError::NoBinding { .. }
            | CoordinatorError::AlreadyPublished(_)
            | CoordinatorError::Trust(_)
            | CoordinatorError::SideEffect(_)
            | CoordinatorError::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionKind;

    #[test]
    fn retry_classification() {
        let busy = CoordinatorError::AlreadyInProgress(FlowKey::new(
            OwnerId::new("u1"),
            ActionKind::Publish,
        ));
        assert!(busy.is_retryable());
        assert_eq!(
            busy.to_string(),
            "a verification for u1/publish is already in progress"
        );
        assert!(CoordinatorError::Signing(SigningError::SigningRejected).is_retryable());
        assert!(!CoordinatorError::Signing(SigningError::Provider("boom".into())).is_retryable());
        assert!(!CoordinatorError::Trust(TrustError::DuplicateGenesis {
            owner: OwnerId::new("u1"),
            wallet_type: WalletType::Extension,
        })
        .is_retryable());
    }
}
