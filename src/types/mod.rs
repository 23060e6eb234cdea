//! Credential type system: claim types, the type DSL parser and type ids.

mod claim;
mod parser;
mod type_id;

pub use claim::{
    validate_claim_name, ClaimDef, ClaimType, CredType, HashAlgorithm, BOOLEAN_WIDTH,
    FORBIDDEN_PREFIXES, MAX_EQUAL_CHECKS, MAX_PROPERTY_WIDTH, MAX_REVOCABLE_DEPTH,
    MAX_SCALAR_WIDTH, MIN_REVOCABLE_DEPTH, RESERVED_NAMES,
};
pub use parser::{parse_claim_type, parse_type};
pub use type_id::{compute_type_id, truncated_keccak, TYPE_ID_BITS};
