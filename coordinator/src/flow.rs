//! Flow identities, requests and outcomes.

use selfproof_signing::SecretMaterial;
use selfproof_types::{Amount, OwnerId, Transaction, VerificationRecord, WalletType};
use std::fmt;

use crate::CoordinatorError;

/// What a verification unlocks. Together with the owner it keys a flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Publish,
    GenesisVerification,
}

impl ActionKind {
    /// Label embedded in the signed message.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Publish => "publish",
            ActionKind::GenesisVerification => "genesis",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At most one flow runs per key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlowKey {
    pub owner_id: OwnerId,
    pub action: ActionKind,
}

impl FlowKey {
    pub fn new(owner_id: OwnerId, action: ActionKind) -> Self {
        Self { owner_id, action }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.action)
    }
}

/// The two flows that share the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationFlow {
    /// Pay the fixed unlock fee to publish a content item.
    PublishBySelfPay { content_id: String },
    /// First verification of a wallet. The amount only fingerprints the
    /// payment for the watcher; it is not a fee.
    GenesisVerification { amount: Amount, replace: bool },
}

impl VerificationFlow {
    pub fn action(&self) -> ActionKind {
        match self {
            VerificationFlow::PublishBySelfPay { .. } => ActionKind::Publish,
            VerificationFlow::GenesisVerification { .. } => ActionKind::GenesisVerification,
        }
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self, VerificationFlow::GenesisVerification { .. })
    }
}

/// Input to [`crate::VerificationCoordinator::start`].
pub struct FlowRequest {
    pub owner_id: OwnerId,
    /// Which of the owner's wallets pays and signs.
    pub wallet_type: WalletType,
    pub flow: VerificationFlow,
    /// PIN material for non-interactive wallets. Ignored by extension wallets.
    pub secret: Option<SecretMaterial>,
}

impl FlowRequest {
    pub fn key(&self) -> FlowKey {
        FlowKey::new(self.owner_id.clone(), self.flow.action())
    }
}

/// Where a running flow is. A key with no running flow is idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowPhase {
    Idle,
    AwaitingSignature,
    Watching,
}

/// Terminal state of one flow.
#[derive(Debug)]
pub enum FlowOutcome {
    /// The payment was seen, the record appended and the side effect applied.
    Confirmed {
        record: Box<VerificationRecord>,
        transaction: Transaction,
    },
    /// No matching payment within the attempt budget. Start again to retry.
    TimedOut { attempts: u32 },
    Cancelled,
    Failed(CoordinatorError),
}

impl FlowOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, FlowOutcome::Confirmed { .. })
    }
}
