//! BabyZK proving stack: Poseidon digests, Baby Jubjub EdDSA signatures and
//! Groth16 proofs over BN254.

pub mod eddsa;
pub mod groth16;
mod input;
pub mod solidity;

pub use input::gen_circuit_input;

use ark_bn254::Fr;
use num_bigint::BigUint;

use crate::circuit::{gen_circuit, Circuit};
use crate::config::{Artifact, StackConfig};
use crate::credential::VerificationStack;
use crate::error::{Error, Result};
use crate::field::{from_field, to_field};
use crate::poseidon::{PoseidonHasher, SpongeHasher};
use crate::stack::{CircuitInputRequest, Proof, ProvingStack, Witness, WitnessProver};
use crate::types::CredType;

/// BabyZK stack context. Construct, [`prepare`](ProvingStack::prepare),
/// then thread through credential operations.
pub struct BabyzkStack {
    config: StackConfig,
    hasher: Option<PoseidonHasher>,
    prover: Option<Box<dyn WitnessProver>>,
}

impl BabyzkStack {
    /// Create a new, unprepared stack.
    pub fn new(config: StackConfig) -> Self {
        Self {
            config,
            hasher: None,
            prover: None,
        }
    }

    /// Attach the external witness calculator and prover.
    pub fn with_prover(mut self, prover: Box<dyn WitnessProver>) -> Self {
        self.prover = Some(prover);
        self
    }

    /// Get the stack configuration.
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Verify a proof of `circuit` with the verifying key stored under
    /// `artifacts_dir`.
    pub fn verify_proof(&self, circuit: &Circuit, proof: &Proof) -> Result<bool> {
        let path = self.config.artifact_path(&circuit.type_id, Artifact::VerifyingKey);
        let vkey = std::fs::read_to_string(&path)?;
        self.verify_proof_raw(circuit, &vkey, proof)
    }

    fn poseidon(&self) -> Result<&PoseidonHasher> {
        self.hasher
            .as_ref()
            .ok_or_else(|| Error::NotPrepared("call prepare() before using the babyzk stack".into()))
    }
}

impl Default for BabyzkStack {
    fn default() -> Self {
        Self::new(StackConfig::default())
    }
}

impl ProvingStack for BabyzkStack {
    fn prepare(&mut self) -> Result<()> {
        self.config.validate()?;
        if self.hasher.is_none() {
            self.hasher = Some(PoseidonHasher::new());
            tracing::debug!(artifacts = %self.config.artifacts_dir.display(), "babyzk stack prepared");
        }
        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.hasher.is_some()
    }

    fn verification_stack(&self) -> VerificationStack {
        VerificationStack::BabyZk
    }

    fn hasher(&self) -> Result<&dyn SpongeHasher> {
        let hasher: &dyn SpongeHasher = self.poseidon()?;
        Ok(hasher)
    }

    fn gen_identity_commitment(
        &self,
        identity_secret: &BigUint,
        internal_nullifier: &BigUint,
    ) -> Result<BigUint> {
        let h = self
            .poseidon()?
            .hash2(&to_field(identity_secret)?, &to_field(internal_nullifier)?)?;
        Ok(from_field(&h))
    }

    fn derive_public_key(&self, private_key: &[u8]) -> Result<Vec<u8>> {
        eddsa::SigningKey::from_bytes(private_key)?.public_key_bytes()
    }

    fn sign(&self, private_key: &[u8], hash: &Fr) -> Result<Vec<u8>> {
        eddsa::SigningKey::from_bytes(private_key)?.sign(self.poseidon()?, hash)
    }

    fn verify(&self, hash: &Fr, signature: &[u8], public_key: &[u8]) -> Result<bool> {
        Ok(eddsa::verify(self.poseidon()?, hash, signature, public_key))
    }

    fn gen_circuit(&self, tp: &CredType) -> Result<Circuit> {
        let circuit = gen_circuit(tp)?;
        if circuit.public_signal_defs.len() > self.config.max_public_signals {
            return Err(Error::UnsupportableType(format!(
                "{} public signals exceed the configured limit of {}",
                circuit.public_signal_defs.len(),
                self.config.max_public_signals
            )));
        }
        Ok(circuit)
    }

    fn gen_circuit_input(&self, request: &CircuitInputRequest<'_>) -> Result<Witness> {
        let request = CircuitInputRequest {
            signature_index: request
                .signature_index
                .or(Some(self.config.default_signature_index)),
            ..request.clone()
        };
        gen_circuit_input(self.poseidon()?, &request)
    }

    fn gen_proof(&self, type_id: &BigUint, witness: &Witness) -> Result<Proof> {
        self.poseidon()?;
        let prover = self
            .prover
            .as_ref()
            .ok_or_else(|| Error::NotPrepared("no witness prover attached".into()))?;
        let wasm = std::fs::read(self.config.artifact_path(type_id, Artifact::Wasm))?;
        let zkey = std::fs::read(self.config.artifact_path(type_id, Artifact::Zkey))?;
        prover.prove(&wasm, &zkey, witness)
    }

    fn verify_proof_raw(&self, circuit: &Circuit, vkey: &str, proof: &Proof) -> Result<bool> {
        self.poseidon()?;
        groth16::verify_proof_raw(circuit, vkey, proof)
    }

    fn gen_on_chain_verifier_code(&self, circuit: &Circuit, vkey: &str) -> Result<String> {
        solidity::gen_on_chain_verifier_code(circuit, vkey)
    }
}
