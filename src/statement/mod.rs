//! Statements: predicates a holder proves about claims without revealing
//! the raw values.
//!
//! A statement is checked against the concrete claim value before proving
//! so that an unsatisfiable statement fails early with a readable error
//! instead of an unsatisfied witness.

mod query;

pub use query::{Condition, Operation, Query, QueryOptions};

use std::collections::BTreeMap;

use num_bigint::BigUint;

use crate::claim::ClaimValue;
use crate::credential::Body;
use crate::error::{Error, Result};
use crate::field::{join_u256, mask, pow2, split_u256};
use crate::types::{ClaimType, HashAlgorithm};

/// Width of the built-in expiration lower bound.
pub const EXPIRATION_WIDTH: u32 = 64;

/// Bits of a credential id; `out_id_equals_to` carries one more for the flag.
pub const ID_WIDTH: u32 = 248;

/// Inclusive range `[lower_bound, upper_bound]` on a scalar claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarStatement {
    width: u32,
    lower_bound: BigUint,
    upper_bound: BigUint,
}

impl ScalarStatement {
    /// Create a new range statement; bounds must fit `width` bits.
    pub fn new(width: u32, lower_bound: BigUint, upper_bound: BigUint) -> Result<Self> {
        if lower_bound > upper_bound {
            return Err(Error::InvalidQuery(format!(
                "lower bound {lower_bound} is greater than upper bound {upper_bound}"
            )));
        }
        if upper_bound >= pow2(width) {
            return Err(Error::InvalidQuery(format!(
                "upper bound {upper_bound} does not fit in {width} bits"
            )));
        }
        Ok(Self {
            width,
            lower_bound,
            upper_bound,
        })
    }

    /// Get the inclusive lower bound.
    pub fn lower_bound(&self) -> &BigUint {
        &self.lower_bound
    }

    /// Get the inclusive upper bound.
    pub fn upper_bound(&self) -> &BigUint {
        &self.upper_bound
    }

    fn check_value(&self, value: &BigUint) -> Result<()> {
        if value < &self.lower_bound || value > &self.upper_bound {
            return Err(Error::InvalidStatementCheck(format!(
                "value {value} is out of range [{}, {}]",
                self.lower_bound, self.upper_bound
            )));
        }
        Ok(())
    }
}

/// Equality checks of a property hash against `equals_to` constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropStatement {
    tp: ClaimType,
    equals_to: Vec<BigUint>,
}

impl PropStatement {
    /// Each constant must fit the claim width, since the circuit discloses
    /// `constant * 2 + flag` under a `width + 1` bit ceiling.
    pub fn new(tp: &ClaimType, equals_to: Vec<BigUint>) -> Result<Self> {
        let ClaimType::Property { width, .. } = *tp else {
            return Err(Error::InvalidQuery(format!("property statement on {tp} claim")));
        };
        Self::bounded(tp, equals_to, width)
    }

    fn bounded(tp: &ClaimType, equals_to: Vec<BigUint>, bits: u32) -> Result<Self> {
        let ClaimType::Property { n_equal_checks, .. } = *tp else {
            return Err(Error::InvalidQuery(format!("property statement on {tp} claim")));
        };
        if equals_to.len() != n_equal_checks as usize {
            return Err(Error::InvalidQuery(format!(
                "expected {n_equal_checks} equality value(s), got {}",
                equals_to.len()
            )));
        }
        let ceiling = pow2(bits);
        if let Some(v) = equals_to.iter().find(|v| **v >= ceiling) {
            return Err(Error::InvalidQuery(format!("{v} does not fit in {bits} bits")));
        }
        Ok(Self { tp: *tp, equals_to })
    }

    /// Claim type the statement was built for.
    pub fn claim_type(&self) -> &ClaimType {
        &self.tp
    }

    /// Get the equality constants.
    pub fn equals_to(&self) -> &[BigUint] {
        &self.equals_to
    }

    /// Whether `hash` equals any constant.
    pub fn matches(&self, hash: &BigUint) -> bool {
        self.equals_to.contains(hash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolStatement {
    reveal: bool,
}

impl BoolStatement {
    /// Create a new boolean statement.
    pub fn new(reveal: bool) -> Self {
        Self { reveal }
    }

    pub fn reveal(&self) -> bool {
        self.reveal
    }
}

/// Statement about one claim; variants mirror [`ClaimType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Scalar(ScalarStatement),
    Prop(PropStatement),
    Bool(BoolStatement),
}

impl Statement {
    /// Range statement for a scalar claim type.
    pub fn range(tp: &ClaimType, lower_bound: BigUint, upper_bound: BigUint) -> Result<Self> {
        let ClaimType::Scalar { width } = *tp else {
            return Err(Error::InvalidQuery(format!("range statement on {tp} claim")));
        };
        ScalarStatement::new(width, lower_bound, upper_bound).map(Statement::Scalar)
    }

    /// Equality statement for a property claim type.
    pub fn equals(tp: &ClaimType, equals_to: Vec<BigUint>) -> Result<Self> {
        PropStatement::new(tp, equals_to).map(Statement::Prop)
    }

    /// Reveal or hide a boolean claim.
    pub fn reveal(reveal: bool) -> Self {
        Statement::Bool(BoolStatement::new(reveal))
    }

    /// Check the statement against a value; returns auxiliary disclosed
    /// values (equality flag for properties, the value for revealed booleans).
    pub fn check(&self, value: &ClaimValue) -> Result<Vec<BigUint>> {
        let limbs = value.limbs();
        match (self, value.claim_type()) {
            (Statement::Scalar(s), ClaimType::Scalar { width }) if width == s.width => {
                let v = if width == 256 {
                    join_u256(&limbs[0], &limbs[1])
                } else {
                    limbs[0].clone()
                };
                s.check_value(&v)?;
                Ok(Vec::new())
            }
            (Statement::Prop(p), tp @ ClaimType::Property { .. }) if tp == p.tp => {
                Ok(vec![BigUint::from(u8::from(p.matches(&limbs[0])))])
            }
            (Statement::Bool(b), ClaimType::Boolean) => {
                Ok(if b.reveal { limbs } else { Vec::new() })
            }
            (_, tp) => Err(Error::InvalidStatementCheck(format!(
                "{} statement cannot check a {tp} value",
                self.kind()
            ))),
        }
    }

    /// Values of the statement's op signals, in FieldDef op order.
    pub fn op_values(&self) -> Vec<BigUint> {
        match self {
            Statement::Scalar(s) if s.width == 256 => {
                let [lb_msb, lb_lsb] = split_u256(&s.lower_bound);
                let [ub_msb, ub_lsb] = split_u256(&s.upper_bound);
                vec![lb_msb, lb_lsb, ub_msb, ub_lsb]
            }
            Statement::Scalar(s) => vec![s.lower_bound.clone(), s.upper_bound.clone()],
            Statement::Prop(p) => p.equals_to.clone(),
            Statement::Bool(b) => vec![BigUint::from(u8::from(!b.reveal))],
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Statement::Scalar(_) => "range",
            Statement::Prop(_) => "equality",
            Statement::Bool(_) => "reveal",
        }
    }
}

/// Statements for every claim of a body plus the two built-in statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementList {
    expiration_lb: ScalarStatement,
    id_equals_to: PropStatement,
    statements: Vec<Statement>,
}

impl StatementList {
    /// Create a statement list with the built-in expiration and id statements.
    pub fn new(expiration_lb: u64, id_equals_to: BigUint, statements: Vec<Statement>) -> Result<Self> {
        let id_tp = ClaimType::property(8, HashAlgorithm::Custom, 1)?;
        Ok(Self {
            expiration_lb: ScalarStatement::new(
                EXPIRATION_WIDTH,
                BigUint::from(expiration_lb),
                mask(EXPIRATION_WIDTH),
            )?,
            id_equals_to: PropStatement::bounded(&id_tp, vec![id_equals_to], ID_WIDTH)
                .map_err(|e| e.context("id_equals_to"))?,
            statements,
        })
    }

    /// Get the per-claim statements, in claim order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn expiration_lb(&self) -> &BigUint {
        self.expiration_lb.lower_bound()
    }

    pub fn id_equals_to(&self) -> &BigUint {
        &self.id_equals_to.equals_to[0]
    }

    /// Signature expiry must not be before the expiration lower bound.
    pub fn check_expiration(&self, expired_at: u64) -> Result<()> {
        self.expiration_lb
            .check_value(&BigUint::from(expired_at))
            .map_err(|e| e.context("expiration_lb"))
    }

    /// Whether the credential id equals the requested id.
    pub fn id_matches(&self, id: &BigUint) -> bool {
        self.id_equals_to.matches(id)
    }

    /// Check every statement against the body, in claim order.
    pub fn check_body(&self, body: &Body) -> Result<BTreeMap<String, Vec<BigUint>>> {
        let values = body.values();
        if self.statements.len() != values.len() {
            return Err(Error::InvalidStatementCheck(format!(
                "{} statement(s) for {} claim(s)",
                self.statements.len(),
                values.len()
            )));
        }
        let mut aux = BTreeMap::new();
        for ((claim, value), statement) in body.tp().claims().iter().zip(values).zip(&self.statements) {
            let out = statement
                .check(value)
                .map_err(|e| e.context(&format!("claim {}", claim.name)))?;
            aux.insert(claim.name.clone(), out);
        }
        Ok(aux)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::parse_type;
    use proptest::prelude::*;

    fn n(v: u64) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn test_scalar_construction() {
        let tp = ClaimType::scalar(8).unwrap();
        assert!(Statement::range(&tp, n(5), n(4)).is_err());
        assert!(Statement::range(&tp, n(0), n(256)).is_err());
        assert!(Statement::range(&ClaimType::Boolean, n(0), n(1)).is_err());
    }

    #[test]
    fn test_scalar_u256_reconstruction() {
        let tp = ClaimType::scalar(256).unwrap();
        let big = (n(1) << 128u32) + n(5);
        let value = ClaimValue::scalar(&tp, big.clone()).unwrap();
        let ok = Statement::range(&tp, big.clone(), big.clone()).unwrap();
        assert!(ok.check(&value).unwrap().is_empty());
        let below = Statement::range(&tp, n(0), (n(1) << 128u32) + n(4)).unwrap();
        let e = below.check(&value).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidStatementCheck);
        assert!(e.to_string().contains(&big.to_string()));
    }

    #[test]
    fn test_op_values_u256() {
        let tp = ClaimType::scalar(256).unwrap();
        let s = Statement::range(&tp, n(50), n(101)).unwrap();
        assert_eq!(s.op_values(), vec![n(0), n(50), n(0), n(101)]);
        assert_eq!(Statement::reveal(false).op_values(), vec![n(1)]);
        assert_eq!(Statement::reveal(true).op_values(), vec![n(0)]);
    }

    #[test]
    fn test_prop_statement() {
        let tp = ClaimType::property(8, HashAlgorithm::Custom, 2).unwrap();
        let value = ClaimValue::prop(&tp, "x", Some(n(4))).unwrap();
        let s = Statement::equals(&tp, vec![n(3), n(4)]).unwrap();
        assert_eq!(s.check(&value).unwrap(), vec![n(1)]);
        let miss = Statement::equals(&tp, vec![n(3), n(5)]).unwrap();
        assert_eq!(miss.check(&value).unwrap(), vec![n(0)]);
        assert!(Statement::equals(&tp, vec![n(3)]).is_err());
    }

    #[test]
    fn test_prop_constants_fit_width() {
        let tp = ClaimType::property(8, HashAlgorithm::Custom, 1).unwrap();
        assert!(Statement::equals(&tp, vec![n(255)]).is_ok());
        let e = Statement::equals(&tp, vec![n(256)]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidQuery);
        assert!(Statement::equals(&tp, vec![n(300)]).is_err());
    }

    #[test]
    fn test_prop_check_count_must_match() {
        let two = ClaimType::property(8, HashAlgorithm::Custom, 2).unwrap();
        let three = ClaimType::property(8, HashAlgorithm::Custom, 3).unwrap();
        let value = ClaimValue::prop(&three, "x", Some(n(4))).unwrap();
        let s = Statement::equals(&two, vec![n(3), n(4)]).unwrap();
        let e = s.check(&value).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidStatementCheck);

        let keccak = ClaimType::property(8, HashAlgorithm::Keccak256, 3).unwrap();
        let s = Statement::equals(&keccak, vec![n(1), n(2), n(4)]).unwrap();
        assert!(s.check(&value).is_err());
    }

    #[test]
    fn test_id_equals_to_bound() {
        let max = n(1) << ID_WIDTH;
        assert!(StatementList::new(0, &max - n(1), vec![]).is_ok());
        let e = StatementList::new(0, max, vec![]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidQuery);
        assert!(e.to_string().contains("id_equals_to"));
        assert!(StatementList::new(0, n(1) << 250u32, vec![]).is_err());
    }

    #[test]
    fn test_bool_statement() {
        let v = ClaimValue::boolean(true);
        assert_eq!(Statement::reveal(true).check(&v).unwrap(), vec![n(1)]);
        assert!(Statement::reveal(false).check(&v).unwrap().is_empty());
    }

    #[test]
    fn test_type_mismatch_is_error() {
        let tp = ClaimType::scalar(8).unwrap();
        let s = Statement::range(&tp, n(0), n(1)).unwrap();
        let e = s.check(&ClaimValue::boolean(true)).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidStatementCheck);
        let wide = ClaimValue::scalar(&ClaimType::scalar(16).unwrap(), 1u32).unwrap();
        assert!(s.check(&wide).is_err());
    }

    #[test]
    fn test_check_body_names_claim() {
        let tp = parse_type("a:uint<8>;b:uint<8>;").unwrap();
        let sc = ClaimType::scalar(8).unwrap();
        let body = Body::new(
            tp,
            vec![ClaimValue::scalar(&sc, 1u32).unwrap(), ClaimValue::scalar(&sc, 9u32).unwrap()],
        )
        .unwrap();
        let stmts = StatementList::new(
            0,
            n(0),
            vec![Statement::range(&sc, n(0), n(5)).unwrap(), Statement::range(&sc, n(0), n(5)).unwrap()],
        )
        .unwrap();
        let e = stmts.check_body(&body).unwrap_err();
        assert!(e.to_string().contains("claim b"));

        let short = StatementList::new(0, n(0), vec![Statement::range(&sc, n(0), n(5)).unwrap()]).unwrap();
        assert!(short.check_body(&body).is_err());
    }

    #[test]
    fn test_expiration_builtin() {
        let stmts = StatementList::new(100, n(0), vec![]).unwrap();
        assert!(stmts.check_expiration(100).is_ok());
        assert!(stmts.check_expiration(99).is_err());
        assert_eq!(stmts.expiration_lb(), &n(100));
    }

    proptest! {
        #[test]
        fn scalar_bounds_are_inclusive(a in 1u64..u32::MAX as u64, b in 1u64..u32::MAX as u64) {
            let (lb, ub) = if a <= b { (a, b) } else { (b, a) };
            let tp = ClaimType::scalar(64).unwrap();
            let s = Statement::range(&tp, n(lb), n(ub)).unwrap();
            let check = |v: u64| s.check(&ClaimValue::scalar(&tp, v).unwrap());
            prop_assert!(check(lb).is_ok());
            prop_assert!(check(ub).is_ok());
            prop_assert!(check(lb - 1).is_err());
            prop_assert!(check(ub + 1).is_err());
        }
    }
}
