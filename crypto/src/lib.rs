//! Hashing primitives for selfproof.
//!
//! - **Blake2b** for record ids and the PIN-derived fallback digest
//! - Content-hash derivation (`signature[0..64]`) and its check

pub mod digest;
pub mod hash;

pub use digest::{content_hash, fallback_digest, is_hex_digest, verify_content_hash};
pub use hash::{blake2b_256, blake2b_256_multi, blake2b_512_multi};
