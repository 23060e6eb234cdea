//! Groth16 verification of snarkjs-format keys and proofs on BN254.

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ff::{BigInteger, PrimeField};
use ark_groth16::{Groth16, Proof as Groth16Proof, VerifyingKey};
use ark_snark::SNARK;
use num_bigint::BigUint;
use serde_json::{json, Value};

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::field::{parse_decimal, to_field};
use crate::stack::Proof;

fn malformed(what: &str) -> Error {
    Error::Serialization(format!("malformed {what}"))
}

fn parse_fq(v: &Value, what: &str) -> Result<Fq> {
    let s = v.as_str().ok_or_else(|| malformed(what))?;
    let n = parse_decimal(s)?;
    if n >= BigUint::from_bytes_le(&Fq::MODULUS.to_bytes_le()) {
        return Err(Error::Serialization(format!("{what}: coordinate not in base field")));
    }
    Ok(Fq::from_le_bytes_mod_order(&n.to_bytes_le()))
}

pub(super) fn fq_str(f: &Fq) -> String {
    BigUint::from_bytes_le(&f.into_bigint().to_bytes_le()).to_string()
}

/// `[x, y, "1"]`, checked on curve and in the prime-order subgroup.
fn parse_g1(v: &Value, what: &str) -> Result<G1Affine> {
    let a = v.as_array().filter(|a| a.len() >= 2).ok_or_else(|| malformed(what))?;
    let p = G1Affine::new_unchecked(parse_fq(&a[0], what)?, parse_fq(&a[1], what)?);
    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(Error::Serialization(format!("{what}: point not in G1")));
    }
    Ok(p)
}

/// `[[x.c0, x.c1], [y.c0, y.c1], ["1", "0"]]`.
fn parse_g2(v: &Value, what: &str) -> Result<G2Affine> {
    let a = v.as_array().filter(|a| a.len() >= 2).ok_or_else(|| malformed(what))?;
    let fq2 = |c: &Value| -> Result<Fq2> {
        let c = c.as_array().filter(|c| c.len() == 2).ok_or_else(|| malformed(what))?;
        Ok(Fq2::new(parse_fq(&c[0], what)?, parse_fq(&c[1], what)?))
    };
    let p = G2Affine::new_unchecked(fq2(&a[0])?, fq2(&a[1])?);
    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(Error::Serialization(format!("{what}: point not in G2")));
    }
    Ok(p)
}

fn g1_json(p: &G1Affine) -> Value {
    json!([fq_str(&p.x), fq_str(&p.y), "1"])
}

fn g2_json(p: &G2Affine) -> Value {
    json!([
        [fq_str(&p.x.c0), fq_str(&p.x.c1)],
        [fq_str(&p.y.c0), fq_str(&p.y.c1)],
        ["1", "0"]
    ])
}

/// Parse a snarkjs verifying key.
pub fn parse_verifying_key(vkey: &Value) -> Result<VerifyingKey<Bn254>> {
    let ic = vkey["IC"]
        .as_array()
        .ok_or_else(|| malformed("IC"))?
        .iter()
        .map(|p| parse_g1(p, "IC"))
        .collect::<Result<Vec<_>>>()?;
    Ok(VerifyingKey {
        alpha_g1: parse_g1(&vkey["vk_alpha_1"], "vk_alpha_1")?,
        beta_g2: parse_g2(&vkey["vk_beta_2"], "vk_beta_2")?,
        gamma_g2: parse_g2(&vkey["vk_gamma_2"], "vk_gamma_2")?,
        delta_g2: parse_g2(&vkey["vk_delta_2"], "vk_delta_2")?,
        gamma_abc_g1: ic,
    })
}

/// Encode a verifying key in snarkjs JSON.
pub fn verifying_key_to_json(vk: &VerifyingKey<Bn254>) -> Value {
    json!({
        "protocol": "groth16",
        "curve": "bn128",
        "nPublic": vk.gamma_abc_g1.len().saturating_sub(1),
        "vk_alpha_1": g1_json(&vk.alpha_g1),
        "vk_beta_2": g2_json(&vk.beta_g2),
        "vk_gamma_2": g2_json(&vk.gamma_g2),
        "vk_delta_2": g2_json(&vk.delta_g2),
        "IC": vk.gamma_abc_g1.iter().map(g1_json).collect::<Vec<_>>(),
    })
}

/// Parse a snarkjs proof object.
pub fn parse_proof(proof: &Value) -> Result<Groth16Proof<Bn254>> {
    Ok(Groth16Proof {
        a: parse_g1(&proof["pi_a"], "pi_a")?,
        b: parse_g2(&proof["pi_b"], "pi_b")?,
        c: parse_g1(&proof["pi_c"], "pi_c")?,
    })
}

/// Encode a proof in snarkjs JSON.
pub fn proof_to_json(proof: &Groth16Proof<Bn254>) -> Value {
    json!({
        "pi_a": g1_json(&proof.a),
        "pi_b": g2_json(&proof.b),
        "pi_c": g1_json(&proof.c),
        "protocol": "groth16",
        "curve": "bn128",
    })
}

/// Verify `proof` for `circuit` against a snarkjs JSON verifying key.
///
/// Public signals are checked against the circuit's ceilings before any
/// pairing work. Malformed keys, proofs or signals are errors; a
/// well-formed proof that fails the pairing check is `Ok(false)`.
pub fn verify_proof_raw(circuit: &Circuit, vkey: &str, proof: &Proof) -> Result<bool> {
    circuit.check_public_signals(&proof.public_signals).map_err(|e| {
        tracing::warn!(type_id = %circuit.type_id, error = %e, "public signals rejected");
        e
    })?;

    let vkey: Value = serde_json::from_str(vkey)?;
    let vk = parse_verifying_key(&vkey)?;
    if vk.gamma_abc_g1.len() != proof.public_signals.len() + 1 {
        return Err(Error::InvalidSignature(format!(
            "verifying key takes {} public signal(s), proof has {}",
            vk.gamma_abc_g1.len().saturating_sub(1),
            proof.public_signals.len()
        )));
    }
    let inputs = proof
        .public_signals
        .iter()
        .map(|v| to_field(v).map_err(|e| Error::InvalidSignature(e.to_string())))
        .collect::<Result<Vec<Fr>>>()?;
    let groth_proof = parse_proof(&proof.proof)?;

    let pvk = Groth16::<Bn254>::process_vk(&vk).map_err(|e| Error::InvalidSignature(e.to_string()))?;
    let valid = Groth16::<Bn254>::verify_with_processed_vk(&pvk, &inputs, &groth_proof)
        .map_err(|e| Error::InvalidSignature(e.to_string()))?;
    if !valid {
        tracing::warn!(type_id = %circuit.type_id, public_signals = inputs.len(), "groth16 proof rejected");
    }
    Ok(valid)
}
