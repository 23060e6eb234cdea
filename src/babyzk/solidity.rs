//! On-chain verifier rendering.
//!
//! Emits a Groth16 verifier contract for one compiled circuit: verifying key
//! constants, intrinsic signal indices and the public signal ceiling
//! checks. The pairing arithmetic comes from an imported `Pairing` library.

use ark_bn254::{G1Affine, G2Affine};
use serde_json::Value;

use super::groth16::{fq_str as fq, parse_verifying_key};
use crate::circuit::{CodeBuilder, Circuit};
use crate::error::{Error, Result};
use crate::field::field_modulus;

const SOLIDITY_VERSION: &str = "^0.8.0";
const PAIRING_LIBRARY: &str = "./Pairing.sol";

fn g1(p: &G1Affine) -> String {
    format!("Pairing.G1Point({}, {})", fq(&p.x), fq(&p.y))
}

/// Ethereum's precompile takes G2 coordinates as `[c1, c0]`.
fn g2(p: &G2Affine) -> String {
    format!(
        "Pairing.G2Point([{}, {}], [{}, {}])",
        fq(&p.x.c1),
        fq(&p.x.c0),
        fq(&p.y.c1),
        fq(&p.y.c0)
    )
}

/// Render the verifier contract for `circuit` and its snarkjs verifying key.
pub fn gen_on_chain_verifier_code(circuit: &Circuit, vkey: &str) -> Result<String> {
    let vkey: Value = serde_json::from_str(vkey)?;
    let vk = parse_verifying_key(&vkey)?;
    let n = circuit.public_signal_defs.len();
    if vk.gamma_abc_g1.len() != n + 1 {
        return Err(Error::Serialization(format!(
            "verifying key has {} public input(s), circuit has {n}",
            vk.gamma_abc_g1.len().saturating_sub(1)
        )));
    }

    let modulus = field_modulus();
    let mut b = CodeBuilder::new();
    b.line("// SPDX-License-Identifier: MIT")
        .line(format!("pragma solidity {SOLIDITY_VERSION};"))
        .blank()
        .line(format!("import {{Pairing}} from \"{PAIRING_LIBRARY}\";"))
        .blank();

    b.open(format!("contract CredentialVerifier_{}", circuit.type_id));
    b.line(format!("uint256 public constant TYPE_ID = {};", circuit.type_id));
    b.line(format!("uint256 public constant NUM_PUBLIC_SIGNALS = {n};"));
    b.line(format!("uint256 constant SNARK_SCALAR_FIELD = {modulus};"));
    for (signal, index) in &circuit.intrinsic_signal_index_map {
        b.line(format!(
            "uint256 public constant {}_INDEX = {index};",
            signal.output_name().to_uppercase()
        ));
    }
    b.blank();

    b.open("function verifyingKey() internal pure returns (Pairing.VerifyingKey memory vk)");
    b.line(format!("vk.alfa1 = {};", g1(&vk.alpha_g1)));
    b.line(format!("vk.beta2 = {};", g2(&vk.beta_g2)));
    b.line(format!("vk.gamma2 = {};", g2(&vk.gamma_g2)));
    b.line(format!("vk.delta2 = {};", g2(&vk.delta_g2)));
    b.line(format!("vk.IC = new Pairing.G1Point[]({});", n + 1));
    for (i, p) in vk.gamma_abc_g1.iter().enumerate() {
        b.line(format!("vk.IC[{i}] = {};", g1(p)));
    }
    b.close().blank();

    b.open("function checkPublicSignals(uint256[] calldata signals) internal pure");
    b.line("require(signals.length == NUM_PUBLIC_SIGNALS, \"bad signal count\");");
    for (i, def) in circuit.public_signal_defs.iter().enumerate() {
        let bound = if def.ceiling == modulus {
            "SNARK_SCALAR_FIELD".to_string()
        } else {
            def.ceiling.to_string()
        };
        b.line(format!("require(signals[{i}] < {bound}, \"{} out of range\");", def.name));
    }
    b.close().blank();

    b.open(
        "function verifyProof(uint256[8] calldata proof, uint256[] calldata signals) \
         external view returns (bool)",
    );
    b.line("checkPublicSignals(signals);");
    b.line("return Pairing.verifyGroth16(verifyingKey(), proof, signals);");
    b.close();
    b.close();

    tracing::debug!(type_id = %circuit.type_id, public_signals = n, "rendered on-chain verifier");
    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::babyzk::groth16::verifying_key_to_json;
    use crate::circuit::gen_circuit;
    use crate::types::parse_type;
    use ark_bn254::Bn254;
    use ark_ec::AffineRepr;
    use ark_groth16::VerifyingKey;

    fn vkey(n_public: usize) -> String {
        let vk = VerifyingKey::<Bn254> {
            alpha_g1: G1Affine::generator(),
            beta_g2: G2Affine::generator(),
            gamma_g2: G2Affine::generator(),
            delta_g2: G2Affine::generator(),
            gamma_abc_g1: vec![G1Affine::generator(); n_public + 1],
        };
        verifying_key_to_json(&vk).to_string()
    }

    #[test]
    fn test_renders_ceilings_and_indices() {
        let circuit = gen_circuit(&parse_type("@revocable(4);vip:bool;").unwrap()).unwrap();
        let n = circuit.public_signal_defs.len();
        let code = gen_on_chain_verifier_code(&circuit, &vkey(n)).unwrap();
        assert!(code.contains("contract CredentialVerifier_0 {"));
        assert!(code.contains(&format!("NUM_PUBLIC_SIGNALS = {n};")));
        assert!(code.contains("OUT_KEY_ID_INDEX = 6;"));
        assert!(code.contains("OUT_SIG_REVOCATION_SMT_ROOT_INDEX = 8;"));
        assert!(code.contains("require(signals[9] < 4, \"out_vip out of range\");"));
        assert!(code.contains("require(signals[2] < SNARK_SCALAR_FIELD"));
        assert!(code.contains(&format!("vk.IC[{n}]")));
    }

    #[test]
    fn test_vkey_arity_must_match() {
        let circuit = gen_circuit(&parse_type("vip:bool;").unwrap()).unwrap();
        assert!(gen_on_chain_verifier_code(&circuit, &vkey(3)).is_err());
    }
}
