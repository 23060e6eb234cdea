//! JSON query language mapped onto a [`StatementList`].
//!
//! ```json
//! {
//!   "conditions": [
//!     {"identifier": "age", "operation": "IN", "value": {"from": "18", "to": "150"}},
//!     {"identifier": "country", "operation": "IS", "value": ["US", "CA"]},
//!     {"identifier": "vip", "operation": "REVEAL"}
//!   ],
//!   "options": {
//!     "expiredAtLowerBound": "1700000000",
//!     "externalNullifier": "42",
//!     "equalCheckId": "0",
//!     "pseudonym": "7"
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Statement, StatementList};
use crate::error::{Error, Result};
use crate::field::{self, parse_decimal};
use crate::types::{truncated_keccak, ClaimType, CredType, HashAlgorithm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Inclusive range, scalar claims.
    In,
    /// Set membership, property claims.
    Is,
    Reveal,
    Hide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub identifier: String,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(with = "field::decimal_u64")]
    pub expired_at_lower_bound: u64,
    #[serde(with = "field::decimal")]
    pub external_nullifier: BigUint,
    #[serde(with = "field::decimal")]
    pub equal_check_id: BigUint,
    #[serde(with = "field::decimal")]
    pub pseudonym: BigUint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub options: QueryOptions,
}

impl Query {
    /// Parse a query from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::InvalidQuery(e.to_string()))
    }

    /// Build the statement list for `tp`. Every claim needs exactly one
    /// condition and every condition must name a claim.
    pub fn to_statement_list(&self, tp: &CredType) -> Result<StatementList> {
        let mut by_name: BTreeMap<&str, &Condition> = BTreeMap::new();
        for cond in &self.conditions {
            if tp.claim(&cond.identifier).is_none() {
                return Err(Error::InvalidQuery(format!(
                    "unknown claim {:?}",
                    cond.identifier
                )));
            }
            if by_name.insert(&cond.identifier, cond).is_some() {
                return Err(Error::InvalidQuery(format!(
                    "more than one condition for claim {:?}",
                    cond.identifier
                )));
            }
        }

        let statements = tp
            .claims()
            .iter()
            .map(|claim| {
                let cond = by_name.get(claim.name.as_str()).ok_or_else(|| {
                    Error::InvalidQuery(format!("no condition for claim {:?}", claim.name))
                })?;
                to_statement(&claim.tp, cond).map_err(|e| e.context(&format!("claim {}", claim.name)))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(conditions = statements.len(), "built statements from query");
        StatementList::new(
            self.options.expired_at_lower_bound,
            self.options.equal_check_id.clone(),
            statements,
        )
    }
}

fn to_statement(tp: &ClaimType, cond: &Condition) -> Result<Statement> {
    match (cond.operation, tp) {
        (Operation::In, ClaimType::Scalar { .. }) => {
            let value = required(cond)?;
            let bound = |key: &str| -> Result<BigUint> {
                let s = value
                    .get(key)
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::InvalidQuery(format!("IN requires string \"{key}\"")))?;
                parse_decimal(s).map_err(|e| Error::InvalidQuery(e.to_string()))
            };
            Statement::range(tp, bound("from")?, bound("to")?)
        }
        (
            Operation::Is,
            ClaimType::Property {
                width,
                hash_algorithm,
                ..
            },
        ) => {
            let items = required(cond)?
                .as_array()
                .ok_or_else(|| Error::InvalidQuery("IS requires an array".into()))?;
            let equals_to = items
                .iter()
                .map(|item| {
                    let s = item
                        .as_str()
                        .ok_or_else(|| Error::InvalidQuery(format!("expected string, got {item}")))?;
                    match hash_algorithm {
                        HashAlgorithm::Keccak256 => Ok(truncated_keccak(s.as_bytes(), *width)),
                        HashAlgorithm::Custom => {
                            parse_decimal(s).map_err(|e| Error::InvalidQuery(e.to_string()))
                        }
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            Statement::equals(tp, equals_to)
        }
        (Operation::Reveal, ClaimType::Boolean) => Ok(Statement::reveal(true)),
        (Operation::Hide, ClaimType::Boolean) => Ok(Statement::reveal(false)),
        (op, tp) => Err(Error::InvalidQuery(format!(
            "operation {op:?} is not applicable to {tp}"
        ))),
    }
}

fn required(cond: &Condition) -> Result<&Value> {
    cond.value
        .as_ref()
        .ok_or_else(|| Error::InvalidQuery(format!("{:?} requires a value", cond.operation)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::parse_type;
    use serde_json::json;

    fn options() -> Value {
        json!({
            "expiredAtLowerBound": "100",
            "externalNullifier": "42",
            "equalCheckId": "0",
            "pseudonym": "7"
        })
    }

    fn query(conditions: Value) -> Query {
        Query::from_json(&json!({"conditions": conditions, "options": options()}).to_string()).unwrap()
    }

    #[test]
    fn test_query_to_statements() {
        let tp = parse_type("age:uint<8>;country:prop<64,keccak256,2>;vip:bool;").unwrap();
        let q = query(json!([
            {"identifier": "vip", "operation": "HIDE"},
            {"identifier": "age", "operation": "IN", "value": {"from": "18", "to": "99"}},
            {"identifier": "country", "operation": "IS", "value": ["US", "CA"]}
        ]));
        assert_eq!(q.options.external_nullifier, BigUint::from(42u32));

        let list = q.to_statement_list(&tp).unwrap();
        let stmts = list.statements();
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0].op_values(), vec![BigUint::from(18u32), BigUint::from(99u32)]);
        assert_eq!(
            stmts[1].op_values(),
            vec![truncated_keccak(b"US", 64), truncated_keccak(b"CA", 64)]
        );
        assert_eq!(stmts[2], Statement::reveal(false));
        assert_eq!(list.expiration_lb(), &BigUint::from(100u32));
    }

    #[test]
    fn test_query_must_cover_every_claim() {
        let tp = parse_type("a:bool;b:bool;").unwrap();
        let missing = query(json!([{"identifier": "a", "operation": "REVEAL"}]));
        assert_eq!(missing.to_statement_list(&tp).unwrap_err().kind(), ErrorKind::InvalidQuery);

        let unknown = query(json!([
            {"identifier": "a", "operation": "REVEAL"},
            {"identifier": "b", "operation": "REVEAL"},
            {"identifier": "c", "operation": "REVEAL"}
        ]));
        assert!(unknown.to_statement_list(&tp).is_err());

        let dup = query(json!([
            {"identifier": "a", "operation": "REVEAL"},
            {"identifier": "a", "operation": "HIDE"}
        ]));
        assert!(dup.to_statement_list(&tp).is_err());
    }

    #[test]
    fn test_operation_type_mismatch() {
        let tp = parse_type("a:uint<8>;").unwrap();
        let q = query(json!([{"identifier": "a", "operation": "REVEAL"}]));
        let e = q.to_statement_list(&tp).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidQuery);
        assert!(e.to_string().contains("claim a"));

        let no_value = query(json!([{"identifier": "a", "operation": "IN"}]));
        assert!(no_value.to_statement_list(&tp).is_err());
    }

    #[test]
    fn test_custom_hash_values_are_decimal() {
        let tp = parse_type("tier:prop<8,custom,1>;").unwrap();
        let ok = query(json!([{"identifier": "tier", "operation": "IS", "value": ["4"]}]));
        assert_eq!(ok.to_statement_list(&tp).unwrap().statements()[0].op_values(), vec![BigUint::from(4u32)]);
        let bad = query(json!([{"identifier": "tier", "operation": "IS", "value": ["gold"]}]));
        assert!(bad.to_statement_list(&tp).is_err());
    }

    #[test]
    fn test_malformed_options_rejected() {
        let raw = json!({"conditions": [], "options": {"expiredAtLowerBound": "-1"}}).to_string();
        assert_eq!(Query::from_json(&raw).unwrap_err().kind(), ErrorKind::InvalidQuery);
    }
}
