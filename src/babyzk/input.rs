//! Circuit input generation.
//!
//! Produces the witness map for the circuit [`crate::circuit::gen_circuit`]
//! renders for the same type. Names and shapes come from the compiled
//! layout so the two lowerings cannot drift; any mismatch is an
//! [`Error::InternalError`].

use num_bigint::BigUint;

use super::eddsa::SignatureParts;
use crate::circuit::{layout, CircuitLayout, IntrinsicSignal};
use crate::credential::VerificationStack;
use crate::error::{Error, Result};
use crate::field::{from_field, to_field};
use crate::poseidon::SpongeHasher;
use crate::stack::{CircuitInputRequest, SignalValue, Witness};

/// Build the named circuit inputs for a signed credential.
pub fn gen_circuit_input(hasher: &dyn SpongeHasher, req: &CircuitInputRequest<'_>) -> Result<Witness> {
    let cred = req.credential;
    let tp = cred.body.tp();

    let unrevoked = match (tp.revocable(), req.unrevoked_proof) {
        (Some(depth), Some(proof)) => {
            proof.check(depth)?;
            Some(proof)
        }
        (Some(_), None) => {
            return Err(Error::InvalidCredential(
                "revocable credential requires an unrevoked proof".into(),
            ))
        }
        (None, _) => None,
    };

    let index = req.signature_index.unwrap_or_default();
    let sig = cred.signatures.get(index).ok_or_else(|| {
        Error::InvalidSignature(format!(
            "no signature at index {index} ({} signature(s))",
            cred.signatures.len()
        ))
    })?;
    if sig.metadata.verification_stack != VerificationStack::BabyZk {
        return Err(Error::InvalidSignature(format!(
            "signature {index} is for stack {}",
            sig.metadata.verification_stack
        )));
    }

    req.statements.check_body(&cred.body)?;
    req.statements.check_expiration(sig.metadata.expired_at)?;
    check_bits("external nullifier", &req.external_nullifier, IntrinsicSignal::ExternalNullifier)?;
    check_bits("pseudonym", &req.pseudonym, IntrinsicSignal::RevealIdentity)?;

    let [ax, ay, r8x, r8y, s] = SignatureParts::decode(&sig.signature, &sig.metadata.public_key)?.signals();
    let hmac = hasher.hash(&[
        to_field(&req.identity_secret)?,
        to_field(&req.external_nullifier)?,
        to_field(&req.pseudonym)?,
    ])?;

    let meta = &sig.metadata;
    let mut witness = Witness::new();
    let mut put = |name: &str, value: BigUint| {
        witness.insert(name.to_string(), SignalValue::Scalar(value));
    };
    put("version", BigUint::from(cred.header.version));
    put("type", cred.header.tp.clone());
    put("context", cred.header.context.clone());
    put("id", cred.header.id.clone());
    put("sig_verification_stack", BigUint::from(meta.verification_stack.code()));
    put("sig_id", meta.signature_id.clone());
    put("sig_expired_at", BigUint::from(meta.expired_at));
    put("sig_identity_commitment", meta.identity_commitment.clone());
    put("sig_pubkey_Ax", ax);
    put("sig_pubkey_Ay", ay);
    put("sig_R8x", r8x);
    put("sig_R8y", r8y);
    put("sig_S", s);
    put("identity_secret", req.identity_secret.clone());
    put("internal_nullifier", req.internal_nullifier.clone());
    put("external_nullifier", req.external_nullifier.clone());
    put("revealing_identity", req.pseudonym.clone());
    put("revealing_identity_hmac", from_field(&hmac));
    put("expiration_lb", req.statements.expiration_lb().clone());
    put("id_equals_to", req.statements.id_equals_to().clone());
    if let Some(proof) = unrevoked {
        put("sig_revocation_smt_root", proof.root.clone());
        put("sig_revocation_smt_old_key", proof.old_key.clone());
        put("sig_revocation_smt_old_value", proof.old_value.clone());
        put("sig_revocation_smt_is_old0", proof.is_old0_value());
        put("sig_revocation_smt_value", proof.value.clone());
        witness.insert(
            "sig_revocation_smt_siblings".to_string(),
            SignalValue::Array(proof.siblings.clone()),
        );
    }

    let layout = layout(tp)?;
    check_intrinsics(&layout, &witness)?;

    for (def, (value, statement)) in layout
        .fields
        .defs()
        .iter()
        .zip(cred.body.values().iter().zip(req.statements.statements()))
    {
        let limbs = value.limbs();
        let ops = statement.op_values();
        if limbs.len() != def.inputs.len() || ops.len() != def.ops.len() {
            return Err(Error::InternalError(format!(
                "claim {}: {} input / {} op signal(s), got {} limb(s) / {} op value(s)",
                def.claim.name,
                def.inputs.len(),
                def.ops.len(),
                limbs.len(),
                ops.len()
            )));
        }
        for (name, v) in def.inputs.iter().chain(&def.ops).zip(limbs.into_iter().chain(ops)) {
            witness.insert(name.clone(), SignalValue::Scalar(v));
        }
    }

    let expected = layout.intrinsic_inputs.len()
        + layout.fields.input_names().len()
        + layout.fields.op_names().len();
    if witness.len() != expected {
        return Err(Error::InternalError(format!(
            "circuit declares {expected} input signal(s), witness has {}",
            witness.len()
        )));
    }

    tracing::debug!(
        type_id = %tp.type_id(),
        signals = witness.len(),
        signature_index = index,
        "built circuit input"
    );
    Ok(witness)
}

fn check_bits(what: &str, value: &BigUint, signal: IntrinsicSignal) -> Result<()> {
    let def = signal.def();
    if value >= &def.ceiling {
        return Err(Error::InvalidQuery(format!(
            "{what} {value} exceeds the {} bound",
            def.name
        )));
    }
    Ok(())
}

fn check_intrinsics(layout: &CircuitLayout, witness: &Witness) -> Result<()> {
    for input in &layout.intrinsic_inputs {
        match witness.get(&input.name) {
            Some(v) if v.len() == input.len => {}
            Some(v) => {
                return Err(Error::InternalError(format!(
                    "signal {} has shape {:?}, circuit expects {:?}",
                    input.name,
                    v.len(),
                    input.len
                )))
            }
            None => {
                return Err(Error::InternalError(format!(
                    "no value for circuit input {}",
                    input.name
                )))
            }
        }
    }
    Ok(())
}
