//! The PIN-derived fallback digest and content-hash tags.
//!
//! The fallback digest is a one-way hash, not a signature: anyone holding the
//! same PIN, message and address can reproduce it, and nobody can check it
//! against a public key.

use crate::hash::blake2b_512_multi;
use selfproof_types::record::CONTENT_HASH_LEN;
use selfproof_types::WalletAddress;

/// Domain separator mixed into every fallback digest.
const FALLBACK_DOMAIN: &[u8] = b"selfproof/pin-fallback/v1";

/// Hex-encoded Blake2b-512 over `message ‖ secret ‖ address`.
///
/// Fields are length-prefixed so that shifting bytes between them cannot
/// produce the same digest.
pub fn fallback_digest(message: &str, secret: &[u8], address: &WalletAddress) -> String {
    let msg_len = (message.len() as u64).to_le_bytes();
    let secret_len = (secret.len() as u64).to_le_bytes();
    let addr_len = (address.as_str().len() as u64).to_le_bytes();
    let digest = blake2b_512_multi(&[
        FALLBACK_DOMAIN,
        &msg_len,
        message.as_bytes(),
        &secret_len,
        secret,
        &addr_len,
        address.as_str().as_bytes(),
    ]);
    hex::encode(digest)
}

/// The first 64 characters of a signature, or `None` if it is shorter.
pub fn content_hash(signature: &str) -> Option<String> {
    signature.get(..CONTENT_HASH_LEN).map(str::to_string)
}

/// Whether `hash` is the content hash of `signature`.
pub fn verify_content_hash(signature: &str, hash: &str) -> bool {
    content_hash(signature).is_some_and(|expected| expected == hash)
}

/// Exactly 64 lowercase-or-uppercase hex characters.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == CONTENT_HASH_LEN && s.chars().all(|c| c.is_ascii_hexdigit())
}
