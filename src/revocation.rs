//! Revocation accumulator interface.
//!
//! Revocable credentials are leaves of an external sparse Merkle tree keyed
//! by signature id. A holder proves non-revocation with a non-membership
//! proof, which is passed through to the circuit unchanged.

use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field;

/// Sparse Merkle tree non-membership proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnrevokedProof {
    #[serde(with = "field::decimal")]
    pub root: BigUint,
    #[serde(with = "field::decimal_vec")]
    pub siblings: Vec<BigUint>,
    #[serde(with = "field::decimal")]
    pub old_key: BigUint,
    #[serde(with = "field::decimal")]
    pub old_value: BigUint,
    pub is_old0: bool,
    #[serde(with = "field::decimal")]
    pub value: BigUint,
}

impl UnrevokedProof {
    /// Siblings must fill the tree depth; every entry must be a field element.
    pub fn check(&self, depth: u32) -> Result<()> {
        if self.siblings.len() != depth as usize {
            return Err(Error::InvalidCredential(format!(
                "unrevoked proof has {} siblings, tree depth is {depth}",
                self.siblings.len()
            )));
        }
        let modulus = field::field_modulus();
        let too_large = [&self.root, &self.old_key, &self.old_value, &self.value]
            .into_iter()
            .chain(&self.siblings)
            .any(|v| v >= &modulus);
        if too_large {
            return Err(Error::InvalidCredential(
                "unrevoked proof holds a value outside the field".into(),
            ));
        }
        Ok(())
    }

    /// `is_old0` as a circuit input (0 or 1).
    pub fn is_old0_value(&self) -> BigUint {
        if self.is_old0 {
            BigUint::one()
        } else {
            BigUint::default()
        }
    }
}

/// Source of non-revocation proofs, usually backed by an on-chain registry.
pub trait RevocationAccumulator {
    fn generate_unrevoked_proof(&self, signature_id: &BigUint) -> Result<UnrevokedProof>;
}
