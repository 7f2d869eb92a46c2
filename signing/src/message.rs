//! Canonical text that gets signed.

use selfproof_types::{OwnerId, Timestamp, WalletAddress};
use std::fmt;

/// What a verification signature commits to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationMessage {
    /// Short action label, e.g. `publish` or `genesis`.
    pub action: String,
    pub owner_id: OwnerId,
    pub address: WalletAddress,
    /// Start of the verification window; the self-payment must not predate it.
    pub timestamp: Timestamp,
}

impl fmt::Display for VerificationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "selfproof:{}:{}:{}:{}",
            self.action,
            self.owner_id,
            self.address,
            self.timestamp.as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_field() {
        let msg = VerificationMessage {
            action: "publish".into(),
            owner_id: OwnerId::new("u1"),
            address: WalletAddress::new("kaspa:abc"),
            timestamp: Timestamp::from_millis(42),
        };
        assert_eq!(msg.to_string(), "selfproof:publish:u1:kaspa:abc:42");
    }
}
