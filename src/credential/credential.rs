use std::collections::BTreeMap;

use ark_bn254::Fr;
use num_bigint::BigUint;
use num_traits::Zero;

use super::header::Header;
use super::signature::{Signature, SignatureMetadata};
use crate::claim::ClaimValue;
use crate::error::{Error, Result};
use crate::field::{pack_bytes, pow2, to_field};
use crate::poseidon::SpongeHasher;
use crate::stack::ProvingStack;
use crate::types::CredType;

/// Claim values of a credential, in claim order of its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    tp: CredType,
    values: Vec<ClaimValue>,
}

impl Body {
    /// Create a body; values must match the type's claims in order.
    pub fn new(tp: CredType, values: Vec<ClaimValue>) -> Result<Self> {
        if values.len() != tp.claims().len() {
            return Err(Error::InvalidCredential(format!(
                "type has {} claim(s), got {} value(s)",
                tp.claims().len(),
                values.len()
            )));
        }
        for (claim, value) in tp.claims().iter().zip(&values) {
            if value.claim_type() != claim.tp {
                return Err(Error::InvalidCredential(format!(
                    "claim {} expects {}, got {}",
                    claim.name,
                    claim.tp,
                    value.claim_type()
                )));
            }
        }
        Ok(Self { tp, values })
    }

    /// Get the credential type.
    pub fn tp(&self) -> &CredType {
        &self.tp
    }

    pub fn values(&self) -> &[ClaimValue] {
        &self.values
    }

    /// Look up a claim value by name.
    pub fn value(&self, name: &str) -> Option<&ClaimValue> {
        self.tp
            .claims()
            .iter()
            .position(|c| c.name == name)
            .map(|i| &self.values[i])
    }

    /// Field-element limbs of every value, flattened in claim order.
    pub fn limbs(&self) -> Vec<Fr> {
        self.values.iter().flat_map(ClaimValue::value).collect()
    }
}

/// A typed, signed bundle of claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub header: Header,
    pub body: Body,
    pub signatures: Vec<Signature>,
    pub attachments: BTreeMap<String, String>,
}

impl Credential {
    /// An unsigned credential. The header must carry the body's type id.
    pub fn new(header: Header, body: Body) -> Result<Self> {
        if &header.tp != body.tp().type_id() {
            return Err(Error::InvalidCredential(format!(
                "header type {} does not match type id {}",
                header.tp,
                body.tp().type_id()
            )));
        }
        Ok(Self {
            header,
            body,
            signatures: Vec::new(),
            attachments: BTreeMap::new(),
        })
    }

    /// Attach key/value data kept out of the primary digest.
    pub fn with_attachments(mut self, attachments: BTreeMap<String, String>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Digest signed by the issuer:
    /// `H(H(version, type, context, id, stack, sig id, expired at, identity commitment), H(body))`.
    ///
    /// Attachments are not part of the digest.
    pub fn hash(&self, hasher: &dyn SpongeHasher, metadata: &SignatureMetadata) -> Result<Fr> {
        let h = &self.header;
        let fields = [
            BigUint::from(h.version),
            h.tp.clone(),
            h.context.clone(),
            h.id.clone(),
            BigUint::from(metadata.verification_stack.code()),
            metadata.signature_id.clone(),
            BigUint::from(metadata.expired_at),
            metadata.identity_commitment.clone(),
        ]
        .iter()
        .map(|v| to_field(v).map_err(|e| Error::InvalidCredential(e.to_string())))
        .collect::<Result<Vec<Fr>>>()?;

        let head = hasher.hash(&fields)?;
        let limbs = self.body.limbs();
        let body = if limbs.is_empty() {
            Fr::zero()
        } else {
            hasher.hash(&limbs)?
        };
        hasher.hash2(&head, &body)
    }

    /// Digest of the attachments: sponge over the sorted JSON encoding.
    pub fn attachments_hash(&self, hasher: &dyn SpongeHasher) -> Result<Fr> {
        let json = serde_json::to_string(&self.attachments)?;
        hasher.hash(&pack_bytes(json.as_bytes()))
    }

    /// Sign under `metadata` and append the signature.
    pub fn sign(
        &mut self,
        stack: &dyn ProvingStack,
        private_key: &[u8],
        metadata: SignatureMetadata,
    ) -> Result<()> {
        if metadata.verification_stack != stack.verification_stack() {
            return Err(Error::InvalidSignature(format!(
                "metadata names stack {}, signing with {}",
                metadata.verification_stack,
                stack.verification_stack()
            )));
        }
        if metadata.signature_id.is_zero() {
            return Err(Error::InvalidSignature("signature id must be nonzero".into()));
        }
        if let Some(depth) = self.body.tp().revocable() {
            if metadata.signature_id >= pow2(depth) {
                return Err(Error::InvalidSignature(format!(
                    "signature id {} does not fit a revocation tree of depth {depth}",
                    metadata.signature_id
                )));
            }
        }
        if stack.derive_public_key(private_key)? != metadata.public_key {
            return Err(Error::InvalidSignature(
                "metadata public key does not match the signing key".into(),
            ));
        }

        let hash = stack.hash(self, &metadata)?;
        let signature = stack.sign(private_key, &hash)?;
        let attachments_signature = if self.attachments.is_empty() {
            None
        } else {
            let hash = self.attachments_hash(stack.hasher()?)?;
            Some(stack.sign(private_key, &hash)?)
        };

        tracing::debug!(
            signature_id = %metadata.signature_id,
            attachments = attachments_signature.is_some(),
            "signed credential"
        );
        self.signatures.push(Signature {
            metadata,
            signature,
            attachments_signature,
        });
        Ok(())
    }

    /// Verify signature `n`, recomputing the digest under that signature's
    /// own metadata. Returns `Ok(false)` when there are no signatures or any
    /// check fails; an out-of-range `n` is an error.
    pub fn verify(
        &self,
        stack: &dyn ProvingStack,
        n: usize,
        include_attachments: bool,
    ) -> Result<bool> {
        if self.signatures.is_empty() {
            return Ok(false);
        }
        let sig = self.signatures.get(n).ok_or_else(|| {
            Error::InvalidSignature(format!(
                "signature index {n} out of range ({} signature(s))",
                self.signatures.len()
            ))
        })?;
        if sig.metadata.verification_stack != stack.verification_stack() {
            return Ok(false);
        }

        let hash = stack.hash(self, &sig.metadata)?;
        if !stack.verify(&hash, &sig.signature, &sig.metadata.public_key)? {
            tracing::warn!(index = n, "credential signature rejected");
            return Ok(false);
        }

        if include_attachments && !self.attachments.is_empty() {
            let Some(att_sig) = &sig.attachments_signature else {
                tracing::warn!(index = n, "attachments present but unsigned");
                return Ok(false);
            };
            let hash = self.attachments_hash(stack.hasher()?)?;
            if !stack.verify(&hash, att_sig, &sig.metadata.public_key)? {
                tracing::warn!(index = n, "attachments signature rejected");
                return Ok(false);
            }
        }
        Ok(true)
    }
}
