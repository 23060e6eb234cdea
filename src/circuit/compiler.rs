//! Compiles a credential type into its circuit: signal layout, public
//! signal table, aggregation list and rendered circuit source.

use std::collections::{BTreeMap, HashSet};

use num_bigint::BigUint;

use super::aggregation::{Aggregation, AggregationMode};
use super::codegen;
use super::field_def::FieldDefList;
use super::signals::{IntrinsicSignal, PublicSignalDef};
use crate::error::{Error, Result};
use crate::types::{CredType, MAX_REVOCABLE_DEPTH, MIN_REVOCABLE_DEPTH};

/// Upper bound on public signals a verifier contract accepts.
pub const MAX_PUBLIC_SIGNALS: usize = 256;

/// A private input of the circuit that is not derived from a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSignal {
    pub name: String,
    /// `Some(n)` for array inputs.
    pub len: Option<usize>,
}

impl InputSignal {
    fn scalar(name: &str) -> Self {
        Self {
            name: name.to_string(),
            len: None,
        }
    }
}

/// Everything the renderer needs, computed once from the type.
#[derive(Debug, Clone)]
pub struct CircuitLayout {
    pub type_id: BigUint,
    pub revocable: Option<u32>,
    pub intrinsic_inputs: Vec<InputSignal>,
    pub fields: FieldDefList,
    pub public_signals: Vec<PublicSignalDef>,
}

/// Compiled circuit for one credential type. Immutable once built.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub type_id: BigUint,
    pub code: String,
    pub public_signal_defs: Vec<PublicSignalDef>,
    pub intrinsic_signal_index_map: BTreeMap<IntrinsicSignal, usize>,
    pub aggregations: Vec<Aggregation>,
}

impl Circuit {
    /// Get the public signal index of an intrinsic signal.
    pub fn intrinsic_index(&self, signal: IntrinsicSignal) -> Option<usize> {
        self.intrinsic_signal_index_map.get(&signal).copied()
    }

    /// Read an intrinsic signal out of a proof's public signals.
    pub fn public_signal<'a>(
        &self,
        signal: IntrinsicSignal,
        public_signals: &'a [BigUint],
    ) -> Option<&'a BigUint> {
        self.intrinsic_index(signal)
            .and_then(|i| public_signals.get(i))
    }

    /// Reject public signals of the wrong arity or above their ceilings.
    pub fn check_public_signals(&self, public_signals: &[BigUint]) -> Result<()> {
        if public_signals.len() != self.public_signal_defs.len() {
            return Err(Error::InvalidSignature(format!(
                "expected {} public signals, got {}",
                self.public_signal_defs.len(),
                public_signals.len()
            )));
        }
        for (def, value) in self.public_signal_defs.iter().zip(public_signals) {
            def.check(value)?;
        }
        Ok(())
    }
}

/// Private inputs shared by every circuit, in declaration order.
fn intrinsic_inputs(revocable: Option<u32>) -> Vec<InputSignal> {
    let mut inputs: Vec<InputSignal> = [
        "version",
        "type",
        "context",
        "id",
        "sig_verification_stack",
        "sig_id",
        "sig_expired_at",
        "sig_identity_commitment",
        "sig_pubkey_Ax",
        "sig_pubkey_Ay",
        "sig_R8x",
        "sig_R8y",
        "sig_S",
        "identity_secret",
        "internal_nullifier",
        "external_nullifier",
        "revealing_identity",
        "revealing_identity_hmac",
        "expiration_lb",
        "id_equals_to",
    ]
    .iter()
    .map(|n| InputSignal::scalar(n))
    .collect();

    if let Some(depth) = revocable {
        inputs.push(InputSignal::scalar("sig_revocation_smt_root"));
        inputs.push(InputSignal {
            name: "sig_revocation_smt_siblings".to_string(),
            len: Some(depth as usize),
        });
        for name in [
            "sig_revocation_smt_old_key",
            "sig_revocation_smt_old_value",
            "sig_revocation_smt_is_old0",
            "sig_revocation_smt_value",
        ] {
            inputs.push(InputSignal::scalar(name));
        }
    }
    inputs
}

/// Lay out all signals of a type without rendering.
pub fn layout(tp: &CredType) -> Result<CircuitLayout> {
    if let Some(depth) = tp.revocable() {
        if !(MIN_REVOCABLE_DEPTH..=MAX_REVOCABLE_DEPTH).contains(&depth) {
            return Err(Error::UnsupportableType(format!(
                "revocable depth {depth} not in [{MIN_REVOCABLE_DEPTH}, {MAX_REVOCABLE_DEPTH}]"
            )));
        }
    }

    let fields = FieldDefList::new(tp.claims());
    let public_signals: Vec<PublicSignalDef> = IntrinsicSignal::for_type(tp.is_revocable())
        .iter()
        .map(IntrinsicSignal::def)
        .chain(fields.outputs().into_iter().cloned())
        .collect();

    let intrinsic_inputs = intrinsic_inputs(tp.revocable());
    check_unique_names(&intrinsic_inputs, &fields, &public_signals)?;

    if public_signals.len() > MAX_PUBLIC_SIGNALS {
        return Err(Error::UnsupportableType(format!(
            "{} public signals exceed the limit of {MAX_PUBLIC_SIGNALS}",
            public_signals.len()
        )));
    }

    Ok(CircuitLayout {
        type_id: tp.type_id().clone(),
        revocable: tp.revocable(),
        intrinsic_inputs,
        fields,
        public_signals,
    })
}

/// Claim-derived names share one namespace with the intrinsic signals, so
/// `a:uint<8>` and `a_lb:bool` both claim `a_lb`.
fn check_unique_names(
    intrinsic_inputs: &[InputSignal],
    fields: &FieldDefList,
    public_signals: &[PublicSignalDef],
) -> Result<()> {
    let mut signals = HashSet::new();
    let names = intrinsic_inputs
        .iter()
        .map(|s| s.name.as_str())
        .chain(fields.input_names())
        .chain(fields.op_names())
        .chain(public_signals.iter().map(|d| d.name.as_str()));
    for name in names {
        if !signals.insert(name) {
            return Err(Error::UnsupportableType(format!(
                "signal {name} is declared more than once"
            )));
        }
    }

    let mut dests = HashSet::new();
    for agg in fields.aggregations() {
        if !dests.insert(agg.dest_name.as_str()) {
            return Err(Error::UnsupportableType(format!(
                "aggregation {} is declared more than once",
                agg.dest_name
            )));
        }
    }
    Ok(())
}

fn aggregations(layout: &CircuitLayout) -> Vec<Aggregation> {
    let mut aggs = vec![Aggregation::new(
        "agg_out_id_equals_to",
        249,
        vec![IntrinsicSignal::IdEqualsTo.output_name().to_string()],
        AggregationMode::MergeUnlessEq,
    )];
    aggs.extend(layout.fields.aggregations().into_iter().cloned());
    aggs.push(Aggregation::new(
        "agg_expiration_lb",
        64,
        vec![IntrinsicSignal::ExpirationLb.output_name().to_string()],
        AggregationMode::TakeGreater,
    ));
    if layout.revocable.is_some() {
        aggs.push(Aggregation::new(
            "sig_smt_root",
            256,
            vec![IntrinsicSignal::SigRevocationSmtRoot.output_name().to_string()],
            AggregationMode::SetToNewValue,
        ));
    }
    aggs
}

/// Compile a credential type. Pure: equal types give equal circuits.
pub fn gen_circuit(tp: &CredType) -> Result<Circuit> {
    let layout = layout(tp)?;
    let code = codegen::render(&layout);

    let intrinsic_signal_index_map = IntrinsicSignal::for_type(tp.is_revocable())
        .into_iter()
        .enumerate()
        .map(|(i, s)| (s, i))
        .collect();

    tracing::debug!(
        type_id = %layout.type_id,
        claims = tp.claims().len(),
        public_signals = layout.public_signals.len(),
        "compiled circuit"
    );

    Ok(Circuit {
        type_id: layout.type_id.clone(),
        aggregations: aggregations(&layout),
        code,
        public_signal_defs: layout.public_signals,
        intrinsic_signal_index_map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::field::pow2;
    use crate::types::parse_type;

    #[test]
    fn test_public_signal_table() {
        let tp = parse_type("age:uint<8>;vip:bool;").unwrap();
        let c = gen_circuit(&tp).unwrap();
        let names: Vec<_> = c.public_signal_defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "out_type",
                "out_context",
                "out_nullifier",
                "out_external_nullifier",
                "out_reveal_identity",
                "out_expiration_lb",
                "out_key_id",
                "out_id_equals_to",
                "out_age_lb",
                "out_age_ub",
                "out_vip",
            ]
        );
        assert_eq!(c.public_signal_defs[5].ceiling, pow2(64));
        assert_eq!(c.intrinsic_index(IntrinsicSignal::KeyId), Some(6));
        assert_eq!(c.intrinsic_index(IntrinsicSignal::SigRevocationSmtRoot), None);
    }

    #[test]
    fn test_revocable_intrinsics() {
        let tp = parse_type("@revocable(8);age:uint<8>;").unwrap();
        let c = gen_circuit(&tp).unwrap();
        assert_eq!(c.intrinsic_index(IntrinsicSignal::SigRevocationSmtRoot), Some(8));
        assert_eq!(c.public_signal_defs[8].name, "out_sig_revocation_smt_root");
        assert_eq!(c.aggregations.last().unwrap().dest_name, "sig_smt_root");
        assert_eq!(c.aggregations.last().unwrap().mode, AggregationMode::SetToNewValue);
    }

    #[test]
    fn test_aggregation_order() {
        let tp = parse_type("a:uint<8>;b:bool;").unwrap();
        let c = gen_circuit(&tp).unwrap();
        let dests: Vec<_> = c.aggregations.iter().map(|a| a.dest_name.as_str()).collect();
        assert_eq!(
            dests,
            vec!["agg_out_id_equals_to", "agg_a_lb", "agg_a_ub", "agg_b", "agg_expiration_lb"]
        );
    }

    #[test]
    fn test_signal_budget() {
        // 8 intrinsics + 62 * 4 = 256: accepted.
        let ok: String = (0..62).map(|i| format!("c{i}:uint<256>;")).collect();
        assert!(gen_circuit(&parse_type(&ok).unwrap()).is_ok());

        let too_many = format!("{ok}extra:bool;");
        let e = gen_circuit(&parse_type(&too_many).unwrap()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::UnsupportableType);
    }

    #[test]
    fn test_derived_signal_names_collide() {
        for dsl in ["a:uint<8>;a_lb:bool;", "x:uint<256>;x_msb:bool;", "p:prop<8,custom,1>;p_eq_check0:bool;"] {
            let tp = parse_type(dsl).unwrap();
            let e = gen_circuit(&tp).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::UnsupportableType, "{dsl}");
            assert!(e.to_string().contains("more than once"), "{dsl}");
        }
        assert!(gen_circuit(&parse_type("a:uint<8>;alb:bool;").unwrap()).is_ok());
    }

    #[test]
    fn test_deterministic() {
        let tp = parse_type("@revocable(4);a:uint<256>;p:prop<64,keccak256,2>;b:bool;")
            .unwrap()
            .with_type_id(BigUint::from(778u32));
        let a = gen_circuit(&tp).unwrap();
        let b = gen_circuit(&tp).unwrap();
        assert_eq!(a.code, b.code);
        assert_eq!(a.public_signal_defs, b.public_signal_defs);
        assert_eq!(a.aggregations, b.aggregations);
        assert_eq!(a.intrinsic_signal_index_map, b.intrinsic_signal_index_map);
    }

    #[test]
    fn test_check_public_signals() {
        let tp = parse_type("vip:bool;").unwrap();
        let c = gen_circuit(&tp).unwrap();
        let mut signals = vec![BigUint::from(1u32); 9];
        assert!(c.check_public_signals(&signals).is_ok());
        signals[8] = BigUint::from(4u32);
        assert_eq!(
            c.check_public_signals(&signals).unwrap_err().kind(),
            ErrorKind::InvalidSignature
        );
        assert!(c.check_public_signals(&signals[..8]).is_err());
        assert_eq!(c.public_signal(IntrinsicSignal::Type, &signals), Some(&BigUint::from(1u32)));
    }
}
