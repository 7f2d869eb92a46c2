//! Signature issuing for verification records.
//!
//! A signature binds the verification message (which embeds the owner, the
//! address and the start timestamp) to either:
//! - an **interactive** signature from the wallet provider (extension wallets), or
//! - a **non-interactive** PIN-derived digest (in-app and imported wallets).
//!
//! The second variant is a weak, clearly labelled stand-in: it is a one-way
//! hash, not a signature verifiable against a public key.

pub mod error;
pub mod issuer;
pub mod message;
pub mod provider;
pub mod secret;

pub use error::SigningError;
pub use issuer::{SignatureIssuer, SignedMessage};
pub use message::VerificationMessage;
pub use provider::{ProviderError, WalletProvider};
pub use secret::SecretMaterial;
