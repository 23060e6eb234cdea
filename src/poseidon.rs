//! Poseidon hash over the BN254 scalar field, circomlib parameters.
//!
//! Credential digests, identity commitments and EdDSA challenges are all
//! computed through the [`SpongeHasher`] capability so that the hash
//! primitive can be swapped without touching the credential model.
//!
//! Inputs longer than one permutation absorbs are chained:
//! `H(x0..x11)`, then `H(acc, next 11)` until exhausted.

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher as _};

use crate::error::{Error, Result};

/// Most inputs a single circom Poseidon instance accepts.
pub const MAX_INPUTS: usize = 12;

/// Hash capability consumed by the credential model.
pub trait SpongeHasher: Send + Sync {
    /// Hash one or more field elements.
    fn hash(&self, elements: &[Fr]) -> Result<Fr>;

    /// Two-to-one compression.
    fn hash2(&self, left: &Fr, right: &Fr) -> Result<Fr> {
        self.hash(&[*left, *right])
    }
}

/// Poseidon as computed by circomlib's `Poseidon(n)` templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseidonHasher;

impl PoseidonHasher {
    /// Create a new hasher. Parameters are built per call.
    pub fn new() -> Self {
        Self
    }

    fn permute(inputs: &[Fr]) -> Result<Fr> {
        Poseidon::<Fr>::new_circom(inputs.len())
            .and_then(|mut p| p.hash(inputs))
            .map_err(|e| Error::InternalError(format!("poseidon over {} input(s): {e}", inputs.len())))
    }
}

impl SpongeHasher for PoseidonHasher {
    fn hash(&self, elements: &[Fr]) -> Result<Fr> {
        if elements.is_empty() {
            return Err(Error::InternalError("poseidon over no inputs".into()));
        }
        let (first, rest) = elements.split_at(elements.len().min(MAX_INPUTS));
        let mut acc = Self::permute(first)?;
        for chunk in rest.chunks(MAX_INPUTS - 1) {
            let mut inputs = Vec::with_capacity(chunk.len() + 1);
            inputs.push(acc);
            inputs.extend_from_slice(chunk);
            acc = Self::permute(&inputs)?;
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::field::from_field;

    fn fr(v: u64) -> Fr {
        Fr::from(v)
    }

    #[test]
    fn test_circomlib_vector() {
        // circomlibjs: poseidon([1, 2])
        let h = PoseidonHasher::new().hash(&[fr(1), fr(2)]).unwrap();
        assert_eq!(
            from_field(&h).to_string(),
            "7853200120776062878684798364095072458815029376092732009249414926327459813530"
        );
    }

    #[test]
    fn test_order_sensitive() {
        let h = PoseidonHasher::new();
        assert_ne!(h.hash2(&fr(1), &fr(2)).unwrap(), h.hash2(&fr(2), &fr(1)).unwrap());
    }

    #[test]
    fn test_long_inputs_chain() {
        let h = PoseidonHasher::new();
        let elements: Vec<Fr> = (1..=30).map(fr).collect();
        let first = h.hash(&elements[..12]).unwrap();
        let mut second = vec![first];
        second.extend_from_slice(&elements[12..23]);
        let second = h.hash(&second).unwrap();
        let mut third = vec![second];
        third.extend_from_slice(&elements[23..]);
        assert_eq!(h.hash(&elements).unwrap(), h.hash(&third).unwrap());
        assert_eq!(h.hash(&elements[..12]).unwrap(), first);
    }

    #[test]
    fn test_empty_input() {
        let e = PoseidonHasher::new().hash(&[]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InternalError);
    }
}
