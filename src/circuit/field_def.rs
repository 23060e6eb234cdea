//! Per-claim circuit signal layout.
//!
//! Every claim is lowered into three groups of signals:
//! - inputs: the private claim value limbs
//! - ops: the statement parameters supplied at proving time
//! - outputs: public signals disclosed by the proof
//!
//! Both the circuit renderer and the circuit input generator read names
//! from here, so the two sides cannot disagree on naming. Order is always
//! claim-definition order.

use crate::types::{ClaimDef, ClaimType};

use super::aggregation::{Aggregation, AggregationMode};
use super::signals::PublicSignalDef;

/// Bits per limb of a 256-bit scalar's disclosed bounds.
const U256_LIMB_BITS: u32 = 128;

/// Ceiling of a boolean output: `value * 2 + revealed` with `value <= 1`.
const BOOLEAN_OUTPUT_BITS: u32 = 2;

/// Signal layout of one claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub claim: ClaimDef,
    pub inputs: Vec<String>,
    pub ops: Vec<String>,
    pub outputs: Vec<PublicSignalDef>,
    pub aggregations: Vec<Aggregation>,
}

impl FieldDef {
    /// Lay out the signals of one claim.
    pub fn new(claim: &ClaimDef) -> Self {
        let n = claim.name.as_str();
        let (inputs, ops, outputs, aggregations) = match claim.tp {
            ClaimType::Scalar { width: 256 } => {
                let ops = names(n, &["lb_msb", "lb_lsb", "ub_msb", "ub_lsb"]);
                let outputs: Vec<_> = ops
                    .iter()
                    .map(|op| PublicSignalDef::bits(out_name(op), U256_LIMB_BITS))
                    .collect();
                let aggs = vec![
                    Aggregation::new(
                        format!("agg_{n}_lb"),
                        256,
                        vec![outputs[0].name.clone(), outputs[1].name.clone()],
                        AggregationMode::TakeGreaterUint256,
                    ),
                    Aggregation::new(
                        format!("agg_{n}_ub"),
                        256,
                        vec![outputs[2].name.clone(), outputs[3].name.clone()],
                        AggregationMode::TakeLessUint256,
                    ),
                ];
                (names(n, &["msb", "lsb"]), ops, outputs, aggs)
            }
            ClaimType::Scalar { width } => {
                let ops = names(n, &["lb", "ub"]);
                let outputs: Vec<_> = ops
                    .iter()
                    .map(|op| PublicSignalDef::bits(out_name(op), width))
                    .collect();
                let aggs = vec![
                    Aggregation::new(
                        format!("agg_{n}_lb"),
                        width,
                        vec![outputs[0].name.clone()],
                        AggregationMode::TakeGreater,
                    ),
                    Aggregation::new(
                        format!("agg_{n}_ub"),
                        width,
                        vec![outputs[1].name.clone()],
                        AggregationMode::TakeLess,
                    ),
                ];
                (vec![n.to_string()], ops, outputs, aggs)
            }
            ClaimType::Property {
                width,
                n_equal_checks,
                ..
            } => {
                let ops: Vec<_> = (0..n_equal_checks)
                    .map(|i| format!("{n}_eq_check{i}"))
                    .collect();
                // One extra bit for the equality flag.
                let outputs: Vec<_> = ops
                    .iter()
                    .map(|op| PublicSignalDef::bits(out_name(op), width + 1))
                    .collect();
                let aggs = ops
                    .iter()
                    .zip(&outputs)
                    .map(|(op, out)| {
                        Aggregation::new(
                            format!("agg_{op}"),
                            width + 1,
                            vec![out.name.clone()],
                            AggregationMode::MergeUnlessEq,
                        )
                    })
                    .collect();
                (vec![n.to_string()], ops, outputs, aggs)
            }
            ClaimType::Boolean => {
                let out = PublicSignalDef::bits(out_name(n), BOOLEAN_OUTPUT_BITS);
                let agg = Aggregation::new(
                    format!("agg_{n}"),
                    BOOLEAN_OUTPUT_BITS,
                    vec![out.name.clone()],
                    AggregationMode::SetIfRevealed,
                );
                (vec![n.to_string()], vec![format!("{n}_hide")], vec![out], vec![agg])
            }
        };
        Self {
            claim: claim.clone(),
            inputs,
            ops,
            outputs,
            aggregations,
        }
    }
}

fn names(claim: &str, suffixes: &[&str]) -> Vec<String> {
    suffixes.iter().map(|s| format!("{claim}_{s}")).collect()
}

fn out_name(signal: &str) -> String {
    format!("out_{signal}")
}

/// FieldDefs of a whole type, in claim-definition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefList(Vec<FieldDef>);

impl FieldDefList {
    /// Lay out every claim, in order.
    pub fn new(claims: &[ClaimDef]) -> Self {
        Self(claims.iter().map(FieldDef::new).collect())
    }

    pub fn defs(&self) -> &[FieldDef] {
        &self.0
    }

    /// All input names, claim by claim.
    pub fn input_names(&self) -> Vec<&str> {
        self.0.iter().flat_map(|d| d.inputs.iter().map(String::as_str)).collect()
    }

    /// All op names, claim by claim.
    pub fn op_names(&self) -> Vec<&str> {
        self.0.iter().flat_map(|d| d.ops.iter().map(String::as_str)).collect()
    }

    pub fn outputs(&self) -> Vec<&PublicSignalDef> {
        self.0.iter().flat_map(|d| d.outputs.iter()).collect()
    }

    pub fn aggregations(&self) -> Vec<&Aggregation> {
        self.0.iter().flat_map(|d| d.aggregations.iter()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::pow2;
    use num_bigint::BigUint;
    use crate::types::HashAlgorithm;

    fn def(name: &str, tp: ClaimType) -> FieldDef {
        FieldDef::new(&ClaimDef::new(name, tp).unwrap())
    }

    #[test]
    fn test_scalar_256_layout() {
        let d = def("age", ClaimType::scalar(256).unwrap());
        assert_eq!(d.inputs, vec!["age_msb", "age_lsb"]);
        assert_eq!(d.ops, vec!["age_lb_msb", "age_lb_lsb", "age_ub_msb", "age_ub_lsb"]);
        assert_eq!(d.outputs.len(), 4);
        assert!(d.outputs.iter().all(|o| o.ceiling == pow2(128)));
        assert_eq!(d.outputs[0].name, "out_age_lb_msb");
        assert_eq!(d.aggregations[0].mode, AggregationMode::TakeGreaterUint256);
        assert_eq!(d.aggregations[1].mode, AggregationMode::TakeLessUint256);
        assert_eq!(d.aggregations[1].src_names, vec!["out_age_ub_msb", "out_age_ub_lsb"]);
    }

    #[test]
    fn test_scalar_layout() {
        let d = def("score", ClaimType::scalar(64).unwrap());
        assert_eq!(d.inputs, vec!["score"]);
        assert_eq!(d.ops, vec!["score_lb", "score_ub"]);
        assert_eq!(d.outputs[1].name, "out_score_ub");
        assert_eq!(d.outputs[1].ceiling, pow2(64));
        assert_eq!(d.aggregations[0].dest_type, "uint64");
        assert_eq!(d.aggregations[0].mode, AggregationMode::TakeGreater);
        assert_eq!(d.aggregations[1].mode, AggregationMode::TakeLess);
    }

    #[test]
    fn test_property_layout() {
        let d = def("tier", ClaimType::property(32, HashAlgorithm::Custom, 3).unwrap());
        assert_eq!(d.inputs, vec!["tier"]);
        assert_eq!(d.ops, vec!["tier_eq_check0", "tier_eq_check1", "tier_eq_check2"]);
        assert_eq!(d.outputs.len(), 3);
        assert_eq!(d.outputs[2].ceiling, pow2(33));
        assert!(d
            .aggregations
            .iter()
            .all(|a| a.mode == AggregationMode::MergeUnlessEq));
    }

    #[test]
    fn test_boolean_layout() {
        let d = def("vip", ClaimType::Boolean);
        assert_eq!(d.ops, vec!["vip_hide"]);
        assert_eq!(d.outputs[0].name, "out_vip");
        assert_eq!(d.outputs[0].ceiling, BigUint::from(4u32));
        assert_eq!(d.aggregations[0].mode, AggregationMode::SetIfRevealed);
    }

    #[test]
    fn test_list_preserves_claim_order() {
        let claims = vec![
            ClaimDef::new("b", ClaimType::Boolean).unwrap(),
            ClaimDef::new("a", ClaimType::scalar(8).unwrap()).unwrap(),
        ];
        let list = FieldDefList::new(&claims);
        assert_eq!(list.input_names(), vec!["b", "a"]);
        assert_eq!(list.op_names(), vec!["b_hide", "a_lb", "a_ub"]);
    }
}
