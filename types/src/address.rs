//! Ledger address type.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An address on the public ledger, e.g. `kaspa:qz0s...`.
///
/// The core never derives addresses; it only compares them. Comparison is exact
/// after trimming surrounding whitespace and lowercasing the network prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Network prefixes accepted by [`WalletAddress::parse`].
    pub const PREFIXES: [&'static str; 4] = ["kaspa", "kaspatest", "kaspadev", "kaspasim"];

    /// Wrap a raw address string without validating it.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(normalize(&raw.into()))
    }

    /// Parse and validate an address of the form `<prefix>:<payload>`.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let normalized = normalize(raw);
        let (prefix, payload) = normalized
            .split_once(':')
            .ok_or_else(|| TypesError::InvalidAddress(raw.to_string()))?;
        if !Self::PREFIXES.contains(&prefix) || payload.is_empty() {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }
        if !payload.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The network prefix, if the address carries one.
    pub fn prefix(&self) -> Option<&str> {
        self.0.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        Self::parse(&self.0).is_ok()
    }
}

fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.split_once(':') {
        Some((prefix, payload)) => format!("{}:{}", prefix.to_ascii_lowercase(), payload),
        None => trimmed.to_string(),
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for WalletAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
