//! Type identifiers assigned at registration.

use num_bigint::BigUint;
use sha3::{Digest, Keccak256};

use crate::field::mask;

/// Bit width of a registered type id.
pub const TYPE_ID_BITS: u32 = 160;

/// `keccak256(creator || name) & (2^160 - 1)`.
pub fn compute_type_id(creator: &[u8], name: &str) -> BigUint {
    let mut hasher = Keccak256::new();
    hasher.update(creator);
    hasher.update(name.as_bytes());
    BigUint::from_bytes_be(&hasher.finalize()) & mask(TYPE_ID_BITS)
}

/// Keccak-256 of `bytes` as a big-endian integer, truncated to `bits`.
pub fn truncated_keccak(bytes: &[u8], bits: u32) -> BigUint {
    BigUint::from_bytes_be(&Keccak256::digest(bytes)) & mask(bits)
}
