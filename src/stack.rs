//! Proving stack capability.
//!
//! A proving stack bundles the cryptographic backend a credential is signed
//! and proven with: the sponge hash, the issuer signature scheme, circuit
//! compilation, witness construction and proof (de)serialisation. Every
//! operation is synchronous; callers wanting timeouts wrap the calls in
//! their own executor.

use std::collections::BTreeMap;

use ark_bn254::Fr;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::circuit::{Circuit, IntrinsicSignal};
use crate::credential::{Credential, SignatureMetadata, VerificationStack};
use crate::error::Result;
use crate::field;
use crate::poseidon::SpongeHasher;
use crate::revocation::UnrevokedProof;
use crate::statement::StatementList;
use crate::types::CredType;

/// Value bound to one named circuit input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Scalar(#[serde(with = "field::decimal")] BigUint),
    Array(#[serde(with = "field::decimal_vec")] Vec<BigUint>),
}

impl SignalValue {
    /// Element count of an array signal; `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            SignalValue::Scalar(_) => None,
            SignalValue::Array(v) => Some(v.len()),
        }
    }

    /// Get the value of a scalar signal.
    pub fn as_scalar(&self) -> Option<&BigUint> {
        match self {
            SignalValue::Scalar(v) => Some(v),
            SignalValue::Array(_) => None,
        }
    }
}

impl From<BigUint> for SignalValue {
    fn from(v: BigUint) -> Self {
        SignalValue::Scalar(v)
    }
}

/// Named circuit inputs, ready for a witness calculator.
pub type Witness = BTreeMap<String, SignalValue>;

/// A proof as exchanged with snarkjs-compatible tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    /// `{pi_a, pi_b, pi_c, protocol, curve}`.
    pub proof: Value,
    #[serde(rename = "publicSignals", with = "field::decimal_vec")]
    pub public_signals: Vec<BigUint>,
}

/// Everything the holder supplies to build a circuit input.
#[derive(Debug, Clone)]
pub struct CircuitInputRequest<'a> {
    pub credential: &'a Credential,
    pub identity_secret: BigUint,
    pub internal_nullifier: BigUint,
    pub external_nullifier: BigUint,
    pub pseudonym: BigUint,
    pub statements: &'a StatementList,
    /// Required for revocable types.
    pub unrevoked_proof: Option<&'a UnrevokedProof>,
    /// Signature to prove with; `None` takes the stack's configured default.
    pub signature_index: Option<usize>,
}

/// Backend external collaborators plug into to prove witnesses.
pub trait WitnessProver: Send + Sync {
    fn prove(&self, wasm: &[u8], zkey: &[u8], witness: &Witness) -> Result<Proof>;
}

/// Capability set of a credential proving stack.
pub trait ProvingStack: Send + Sync {
    /// Load backend parameters. Every other operation fails with
    /// `NotPrepared` until this succeeds.
    fn prepare(&mut self) -> Result<()>;

    fn is_prepared(&self) -> bool;

    fn verification_stack(&self) -> VerificationStack;

    /// Sponge hash used for credential digests.
    fn hasher(&self) -> Result<&dyn SpongeHasher>;

    fn gen_identity_commitment(
        &self,
        identity_secret: &BigUint,
        internal_nullifier: &BigUint,
    ) -> Result<BigUint>;

    /// Public key bytes for a private key.
    fn derive_public_key(&self, private_key: &[u8]) -> Result<Vec<u8>>;

    fn sign(&self, private_key: &[u8], hash: &Fr) -> Result<Vec<u8>>;

    /// `Ok(false)` for any cryptographic mismatch, including malformed keys.
    fn verify(&self, hash: &Fr, signature: &[u8], public_key: &[u8]) -> Result<bool>;

    fn hash(&self, credential: &Credential, metadata: &SignatureMetadata) -> Result<Fr> {
        credential.hash(self.hasher()?, metadata)
    }

    fn gen_circuit(&self, tp: &CredType) -> Result<Circuit>;

    fn gen_circuit_input(&self, request: &CircuitInputRequest<'_>) -> Result<Witness>;

    fn gen_proof(&self, type_id: &BigUint, witness: &Witness) -> Result<Proof>;

    /// Verify a proof of `circuit` against a snarkjs JSON verifying key.
    /// Public signals above their ceilings are rejected before pairing.
    fn verify_proof_raw(&self, circuit: &Circuit, vkey: &str, proof: &Proof) -> Result<bool>;

    fn gen_on_chain_verifier_code(&self, circuit: &Circuit, vkey: &str) -> Result<String>;

    /// Read an intrinsic signal out of a proof's public signals.
    fn default_public_signal_getter(
        &self,
        circuit: &Circuit,
        signal: IntrinsicSignal,
        proof: &Proof,
    ) -> Option<BigUint> {
        circuit.public_signal(signal, &proof.public_signals).cloned()
    }
}
