//! Claim values: typed values and their wire, human and field-limb forms.

use ark_bn254::Fr;
use num_bigint::BigUint;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::field::{self, parse_decimal, pow2, split_u256};
use crate::types::{truncated_keccak, ClaimType, HashAlgorithm};

/// A concrete value for one claim, tagged with the claim's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimValue {
    Scalar(ScalarValue),
    Prop(PropValue),
    Bool(BoolValue),
}

/// Unsigned integer bounded by its claim width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarValue {
    width: u32,
    value: BigUint,
}

/// String claim carried together with its in-circuit hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropValue {
    tp: ClaimType,
    text: String,
    hash: BigUint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolValue {
    value: bool,
}

impl ScalarValue {
    /// Create a new scalar value; must fit the claim width.
    pub fn new(tp: &ClaimType, value: BigUint) -> Result<Self> {
        let ClaimType::Scalar { width } = *tp else {
            return Err(type_mismatch("uint", tp));
        };
        if value >= pow2(width) {
            return Err(Error::InvalidClaimValue(format!(
                "{value} does not fit in {width} bits"
            )));
        }
        Ok(Self { width, value })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the raw value.
    pub fn value(&self) -> &BigUint {
        &self.value
    }
}

impl PropValue {
    /// Build a property value. The hash is recomputed from the string unless
    /// the type's algorithm is `custom`, in which case it must be supplied.
    pub fn new(tp: &ClaimType, text: impl Into<String>, hash: Option<BigUint>) -> Result<Self> {
        let ClaimType::Property {
            width,
            hash_algorithm,
            ..
        } = *tp
        else {
            return Err(type_mismatch("prop", tp));
        };
        let text = text.into();
        let hash = match (hash_algorithm, hash) {
            (HashAlgorithm::Custom, Some(h)) => h,
            (HashAlgorithm::Custom, None) => {
                return Err(Error::InvalidClaimValue(
                    "custom hash algorithm requires an explicit hash".into(),
                ))
            }
            (HashAlgorithm::Keccak256, supplied) => {
                let computed = truncated_keccak(text.as_bytes(), width);
                if let Some(h) = supplied {
                    if h != computed {
                        return Err(Error::InvalidClaimValue(format!(
                            "hash {h} does not match keccak256 of {text:?}"
                        )));
                    }
                }
                computed
            }
        };
        if hash >= pow2(width) {
            return Err(Error::InvalidClaimValue(format!(
                "hash {hash} does not fit in {width} bits"
            )));
        }
        Ok(Self { tp: *tp, text, hash })
    }

    /// Get the original text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the property hash the circuit sees.
    pub fn hash(&self) -> &BigUint {
        &self.hash
    }
}

impl BoolValue {
    /// Create a new boolean value.
    pub fn new(value: bool) -> Self {
        Self { value }
    }

    pub fn value(&self) -> bool {
        self.value
    }
}

impl ClaimValue {
    /// Build a scalar claim value.
    pub fn scalar(tp: &ClaimType, value: impl Into<BigUint>) -> Result<Self> {
        ScalarValue::new(tp, value.into()).map(ClaimValue::Scalar)
    }

    /// Build a property value; the hash is derived from `text` for keccak256 types.
    pub fn prop(tp: &ClaimType, text: impl Into<String>, hash: Option<BigUint>) -> Result<Self> {
        PropValue::new(tp, text, hash).map(ClaimValue::Prop)
    }

    /// Build a boolean claim value.
    pub fn boolean(value: bool) -> Self {
        ClaimValue::Bool(BoolValue::new(value))
    }

    /// Type this value was constructed for.
    pub fn claim_type(&self) -> ClaimType {
        match self {
            ClaimValue::Scalar(v) => ClaimType::Scalar { width: v.width },
            ClaimValue::Prop(v) => v.tp,
            ClaimValue::Bool(_) => ClaimType::Boolean,
        }
    }

    /// Integer limbs in signal order. Width-256 scalars split into `[msb, lsb]`.
    pub fn limbs(&self) -> Vec<BigUint> {
        match self {
            ClaimValue::Scalar(v) if v.width == 256 => split_u256(&v.value).to_vec(),
            ClaimValue::Scalar(v) => vec![v.value.clone()],
            ClaimValue::Prop(v) => vec![v.hash.clone()],
            ClaimValue::Bool(v) => vec![BigUint::from(u8::from(v.value))],
        }
    }

    /// Field-element limbs, as hashed and fed to the circuit.
    pub fn value(&self) -> Vec<Fr> {
        self.limbs().iter().map(field::reduce).collect()
    }

    /// Human readable form.
    pub fn str_value(&self) -> String {
        match self {
            ClaimValue::Scalar(v) => v.value.to_string(),
            ClaimValue::Prop(v) => v.text.clone(),
            ClaimValue::Bool(v) => v.value.to_string(),
        }
    }

    /// Wire form: decimal string, `"true"`/`"false"`, or `{str, value}`.
    pub fn to_json(&self) -> Value {
        match self {
            ClaimValue::Scalar(v) => Value::String(v.value.to_string()),
            ClaimValue::Prop(v) => json!({ "str": v.text, "value": v.hash.to_string() }),
            ClaimValue::Bool(v) => Value::String(v.value.to_string()),
        }
    }

    /// Decode the wire form for a claim of type `tp`.
    pub fn from_json(tp: &ClaimType, value: &Value) -> Result<Self> {
        match tp {
            ClaimType::Scalar { .. } => {
                let s = expect_str(value)?;
                let n = parse_decimal(s).map_err(|e| Error::InvalidClaimValue(e.to_string()))?;
                ClaimValue::scalar(tp, n)
            }
            ClaimType::Property { .. } => {
                let text = value
                    .get("str")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::InvalidClaimValue("property missing \"str\"".into()))?;
                let hash = match value.get("value") {
                    Some(h) => Some(
                        parse_decimal(expect_str(h)?)
                            .map_err(|e| Error::InvalidClaimValue(e.to_string()))?,
                    ),
                    None => None,
                };
                ClaimValue::prop(tp, text, hash)
            }
            ClaimType::Boolean => match expect_str(value)? {
                "true" => Ok(ClaimValue::boolean(true)),
                "false" => Ok(ClaimValue::boolean(false)),
                other => Err(Error::InvalidClaimValue(format!(
                    "expected \"true\" or \"false\", got {other:?}"
                ))),
            },
        }
    }
}

fn expect_str(value: &Value) -> Result<&str> {
    value
        .as_str()
        .ok_or_else(|| Error::InvalidClaimValue(format!("expected string, got {value}")))
}

fn type_mismatch(expected: &str, got: &ClaimType) -> Error {
    Error::InvalidClaimValue(format!("expected {expected} type, got {got}"))
}
