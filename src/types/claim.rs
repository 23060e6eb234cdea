//! Claim types, claim definitions and credential types.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use num_bigint::BigUint;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MIN_REVOCABLE_DEPTH: u32 = 2;
pub const MAX_REVOCABLE_DEPTH: u32 = 248;

pub const BOOLEAN_WIDTH: u32 = 8;
pub const MAX_SCALAR_WIDTH: u32 = 256;
pub const MAX_PROPERTY_WIDTH: u32 = 248;
pub const MAX_EQUAL_CHECKS: u32 = 8;

/// Prefixes reserved for compiler-generated signals.
pub const FORBIDDEN_PREFIXES: &[&str] = &["sig_", "out_", "in_", "agg_"];

/// Names of signals the compiler injects into every circuit.
pub const RESERVED_NAMES: &[&str] = &[
    "version",
    "type",
    "context",
    "id",
    "identity_secret",
    "internal_nullifier",
    "external_nullifier",
    "revealing_identity",
    "revealing_identity_hmac",
    "expiration_lb",
    "id_equals_to",
    "revocation_root",
];

/// How a property string is reduced to its in-circuit hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Keccak-256 of the UTF-8 bytes, truncated to the claim width.
    Keccak256,
    /// Hash supplied by the issuer; only range-checked.
    Custom,
}

impl HashAlgorithm {
    /// DSL spelling of the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Keccak256 => "keccak256",
            HashAlgorithm::Custom => "custom",
        }
    }

    /// Parse a hash algorithm name.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "keccak256" => Ok(HashAlgorithm::Keccak256),
            "custom" => Ok(HashAlgorithm::Custom),
            other => Err(Error::InvalidTypeParameter(format!(
                "unknown hash algorithm {other:?}"
            ))),
        }
    }
}

/// Type of a single claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimType {
    /// Unsigned integer of `width` bits, proven with range statements.
    Scalar { width: u32 },
    /// String reduced to a `width`-bit hash, proven with equality checks.
    Property {
        width: u32,
        hash_algorithm: HashAlgorithm,
        n_equal_checks: u32,
    },
    /// Boolean, revealed or hidden.
    Boolean,
}

impl ClaimType {
    /// Create a scalar type; width is a multiple of 8 in [8, 256].
    pub fn scalar(width: u32) -> Result<Self> {
        check_width(width, MAX_SCALAR_WIDTH)?;
        Ok(ClaimType::Scalar { width })
    }

    /// Create a property type.
    pub fn property(width: u32, hash_algorithm: HashAlgorithm, n_equal_checks: u32) -> Result<Self> {
        check_width(width, MAX_PROPERTY_WIDTH)?;
        if !(1..=MAX_EQUAL_CHECKS).contains(&n_equal_checks) {
            return Err(Error::InvalidTypeParameter(format!(
                "number of equal checks {n_equal_checks} not in [1, {MAX_EQUAL_CHECKS}]"
            )));
        }
        Ok(ClaimType::Property {
            width,
            hash_algorithm,
            n_equal_checks,
        })
    }

    /// Create a boolean type.
    pub fn boolean() -> Self {
        ClaimType::Boolean
    }

    /// Bit width of the claim's value (or hash).
    pub fn width(&self) -> u32 {
        match self {
            ClaimType::Scalar { width } | ClaimType::Property { width, .. } => *width,
            ClaimType::Boolean => BOOLEAN_WIDTH,
        }
    }

    /// Short name used in messages and in the type DSL.
    pub fn type_name(&self) -> &'static str {
        match self {
            ClaimType::Scalar { .. } => "uint",
            ClaimType::Property { .. } => "prop",
            ClaimType::Boolean => "bool",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimType::Scalar { width } => write!(f, "uint<{width}>"),
            ClaimType::Property {
                width,
                hash_algorithm,
                n_equal_checks,
            } => write!(f, "prop<{width},{},{n_equal_checks}>", hash_algorithm.as_str()),
            ClaimType::Boolean => write!(f, "bool"),
        }
    }
}

fn check_width(width: u32, max: u32) -> Result<()> {
    if width < 8 || width > max || width % 8 != 0 {
        return Err(Error::InvalidTypeParameter(format!(
            "width {width} must be a multiple of 8 in [8, {max}]"
        )));
    }
    Ok(())
}

fn claim_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("static regex"))
}

/// Check that a claim name cannot collide with a compiler-injected signal.
pub fn validate_claim_name(name: &str) -> Result<()> {
    if !claim_name_pattern().is_match(name) {
        return Err(Error::InvalidClaimName(format!(
            "{name:?} is not a valid identifier"
        )));
    }
    if let Some(prefix) = FORBIDDEN_PREFIXES.iter().find(|p| name.starts_with(*p)) {
        return Err(Error::InvalidClaimName(format!(
            "{name:?} uses forbidden prefix {prefix:?}"
        )));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(Error::InvalidClaimName(format!("{name:?} is reserved")));
    }
    Ok(())
}

/// A named, typed claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimDef {
    pub name: String,
    pub tp: ClaimType,
}

impl ClaimDef {
    /// Create a claim definition; the name is validated.
    pub fn new(name: impl Into<String>, tp: ClaimType) -> Result<Self> {
        let name = name.into();
        validate_claim_name(&name)?;
        Ok(Self { name, tp })
    }
}

/// A credential type: ordered claims plus pragmas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredType {
    claims: Vec<ClaimDef>,
    revocable: Option<u32>,
    type_id: BigUint,
}

impl CredType {
    /// Build a type with `type_id` 0. Claim names must be unique.
    pub fn new(claims: Vec<ClaimDef>, revocable: Option<u32>) -> Result<Self> {
        let mut seen = HashSet::new();
        for claim in &claims {
            if !seen.insert(claim.name.as_str()) {
                return Err(Error::DuplicateClaimName(claim.name.clone()));
            }
        }
        if let Some(depth) = revocable {
            check_revocable_depth(depth)?;
        }
        Ok(Self {
            claims,
            revocable,
            type_id: BigUint::default(),
        })
    }

    /// Same type, bound to a registered type id.
    pub fn with_type_id(mut self, type_id: BigUint) -> Self {
        self.type_id = type_id;
        self
    }

    /// Get the claims, in definition order.
    pub fn claims(&self) -> &[ClaimDef] {
        &self.claims
    }

    /// Revocation tree depth, if revocable.
    pub fn revocable(&self) -> Option<u32> {
        self.revocable
    }

    pub fn is_revocable(&self) -> bool {
        self.revocable.is_some()
    }

    /// Get the registered type id (0 until bound).
    pub fn type_id(&self) -> &BigUint {
        &self.type_id
    }

    pub fn claim(&self, name: &str) -> Option<&ClaimDef> {
        self.claims.iter().find(|c| c.name == name)
    }

    /// Render back to the type DSL, pragmas first.
    pub fn to_dsl(&self) -> String {
        let mut out = String::new();
        if let Some(depth) = self.revocable {
            out.push_str(&format!("@revocable({depth});"));
        }
        for claim in &self.claims {
            out.push_str(&format!("{}:{};", claim.name, claim.tp));
        }
        out
    }
}

pub(crate) fn check_revocable_depth(depth: u32) -> Result<()> {
    if depth < MIN_REVOCABLE_DEPTH {
        return Err(Error::InvalidPragma(format!(
            "revocable depth {depth} is too small, minimum is {MIN_REVOCABLE_DEPTH}"
        )));
    }
    if depth > MAX_REVOCABLE_DEPTH {
        return Err(Error::InvalidPragma(format!(
            "revocable depth {depth} is too large, maximum is {MAX_REVOCABLE_DEPTH}"
        )));
    }
    Ok(())
}
