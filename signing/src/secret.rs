//! Secret material for the non-interactive signing path.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A PIN or other user secret. Zeroed on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretMaterial(Vec<u8>);

impl SecretMaterial {
    /// Wrap a PIN. Returns `None` for an empty PIN, which counts as "no PIN set".
    pub fn pin(pin: &str) -> Option<Self> {
        let trimmed = pin.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.as_bytes().to_vec()))
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            None
        } else {
            Some(Self(bytes))
        }
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretMaterial(<redacted>)")
    }
}
