//! Blake2b hashing.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512, Digest};

type Blake2b256 = Blake2b<U32>;

fn absorb<D: Digest>(mut hasher: D, parts: &[&[u8]]) -> D {
    for part in parts {
        hasher.update(part);
    }
    hasher
}

/// 256-bit Blake2b of one buffer.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// 256-bit Blake2b over several slices, fed in order without concatenating.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&absorb(Blake2b256::new(), parts).finalize());
    output
}

/// 512-bit Blake2b over several slices.
pub fn blake2b_512_multi(parts: &[&[u8]]) -> [u8; 64] {
    let mut output = [0u8; 64];
    output.copy_from_slice(&absorb(Blake2b512::new(), parts).finalize());
    output
}
