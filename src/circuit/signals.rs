//! Public signal metadata and the protocol's intrinsic signals.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::{field_modulus, pow2};

/// A public output with its exclusive upper bound.
///
/// Any value at or above the ceiling would alias a different in-circuit
/// value and must be rejected before it reaches the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicSignalDef {
    pub name: String,
    pub ceiling: BigUint,
}

impl PublicSignalDef {
    /// Create a new signal with an explicit ceiling.
    pub fn new(name: impl Into<String>, ceiling: BigUint) -> Self {
        Self {
            name: name.into(),
            ceiling,
        }
    }

    /// Signal bounded by `2^bits`.
    pub fn bits(name: impl Into<String>, bits: u32) -> Self {
        Self::new(name, pow2(bits))
    }

    /// Signal bounded only by the field modulus.
    pub fn field(name: impl Into<String>) -> Self {
        Self::new(name, field_modulus())
    }

    /// Reject values at or above the ceiling.
    pub fn check(&self, value: &BigUint) -> Result<()> {
        if value >= &self.ceiling {
            return Err(Error::InvalidSignature(format!(
                "public signal {} = {value} exceeds its ceiling {}",
                self.name, self.ceiling
            )));
        }
        Ok(())
    }
}

/// Outputs present in every compiled circuit, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntrinsicSignal {
    Type,
    Context,
    Nullifier,
    ExternalNullifier,
    RevealIdentity,
    ExpirationLb,
    KeyId,
    IdEqualsTo,
    SigRevocationSmtRoot,
}

impl IntrinsicSignal {
    /// Intrinsics of a non-revocable circuit, in output order.
    pub const FIXED: [IntrinsicSignal; 8] = [
        IntrinsicSignal::Type,
        IntrinsicSignal::Context,
        IntrinsicSignal::Nullifier,
        IntrinsicSignal::ExternalNullifier,
        IntrinsicSignal::RevealIdentity,
        IntrinsicSignal::ExpirationLb,
        IntrinsicSignal::KeyId,
        IntrinsicSignal::IdEqualsTo,
    ];

    /// Intrinsics for a circuit with the given revocability.
    pub fn for_type(revocable: bool) -> Vec<IntrinsicSignal> {
        let mut all = Self::FIXED.to_vec();
        if revocable {
            all.push(IntrinsicSignal::SigRevocationSmtRoot);
        }
        all
    }

    /// Name of the output signal in circuit source.
    pub fn output_name(&self) -> &'static str {
        match self {
            IntrinsicSignal::Type => "out_type",
            IntrinsicSignal::Context => "out_context",
            IntrinsicSignal::Nullifier => "out_nullifier",
            IntrinsicSignal::ExternalNullifier => "out_external_nullifier",
            IntrinsicSignal::RevealIdentity => "out_reveal_identity",
            IntrinsicSignal::ExpirationLb => "out_expiration_lb",
            IntrinsicSignal::KeyId => "out_key_id",
            IntrinsicSignal::IdEqualsTo => "out_id_equals_to",
            IntrinsicSignal::SigRevocationSmtRoot => "out_sig_revocation_smt_root",
        }
    }

    pub fn def(&self) -> PublicSignalDef {
        let name = self.output_name();
        match self {
            IntrinsicSignal::Type | IntrinsicSignal::Context | IntrinsicSignal::ExternalNullifier => {
                PublicSignalDef::bits(name, 160)
            }
            IntrinsicSignal::RevealIdentity => PublicSignalDef::bits(name, 248),
            IntrinsicSignal::ExpirationLb => PublicSignalDef::bits(name, 64),
            IntrinsicSignal::IdEqualsTo => PublicSignalDef::bits(name, 249),
            IntrinsicSignal::Nullifier
            | IntrinsicSignal::KeyId
            | IntrinsicSignal::SigRevocationSmtRoot => PublicSignalDef::field(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_order() {
        let names: Vec<_> = IntrinsicSignal::for_type(true)
            .iter()
            .map(|s| s.output_name())
            .collect();
        assert_eq!(names[0], "out_type");
        assert_eq!(names[7], "out_id_equals_to");
        assert_eq!(names[8], "out_sig_revocation_smt_root");
        assert_eq!(IntrinsicSignal::for_type(false).len(), 8);
    }

    #[test]
    fn test_ceiling_is_exclusive() {
        let def = PublicSignalDef::bits("out_x", 8);
        assert!(def.check(&BigUint::from(255u32)).is_ok());
        assert!(def.check(&BigUint::from(256u32)).is_err());
        assert!(IntrinsicSignal::Nullifier.def().check(&field_modulus()).is_err());
    }
}
