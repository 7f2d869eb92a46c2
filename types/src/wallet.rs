//! Wallet kinds and the owner ↔ address binding.

use crate::{OwnerId, Timestamp, TypesError, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a wallet is held by its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalletType {
    /// A browser extension wallet that can prompt the user to sign.
    Extension,
    /// A wallet generated and held inside the application.
    InAppCustodial,
    /// An identity imported from elsewhere (seed or key), held by the application.
    ImportedIdentity,
}

impl WalletType {
    pub const ALL: [WalletType; 3] = [
        WalletType::Extension,
        WalletType::InAppCustodial,
        WalletType::ImportedIdentity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WalletType::Extension => "extension",
            WalletType::InAppCustodial => "in-app-custodial",
            WalletType::ImportedIdentity => "imported-identity",
        }
    }

    /// Which signing path this kind of wallet supports.
    pub fn capability(&self) -> SigningCapability {
        match self {
            WalletType::Extension => SigningCapability::Interactive,
            WalletType::InAppCustodial | WalletType::ImportedIdentity => {
                SigningCapability::NonInteractive
            }
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WalletType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WalletType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TypesError::UnknownWalletType(s.to_string()))
    }
}

/// Signing strength available for a wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningCapability {
    /// The wallet provider signs after prompting the user.
    Interactive,
    /// A PIN-derived hash stands in for a signature. Weak: not verifiable
    /// against any public key.
    NonInteractive,
}

/// Connects an owner to one address of one wallet type.
///
/// There is at most one binding per (owner, wallet type). Disconnecting hides
/// the binding from the owner's view; it is never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBinding {
    pub owner_id: OwnerId,
    pub wallet_type: WalletType,
    pub address: WalletAddress,
    pub connected_at: Timestamp,
    /// False once the owner disconnects; reconnecting sets it again.
    pub active: bool,
    /// Set when a genesis verification for this binding was confirmed.
    pub genesis_verified_at: Option<Timestamp>,
}

impl WalletBinding {
    pub fn new(
        owner_id: OwnerId,
        wallet_type: WalletType,
        address: WalletAddress,
        connected_at: Timestamp,
    ) -> Self {
        Self {
            owner_id,
            wallet_type,
            address,
            connected_at,
            active: true,
            genesis_verified_at: None,
        }
    }

    pub fn is_genesis_verified(&self) -> bool {
        self.genesis_verified_at.is_some()
    }
}
