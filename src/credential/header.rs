use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::field;

/// Current credential header version.
pub const CREDENTIAL_VERSION: u64 = 1;

/// Credential header. `tp` is the type id the credential was issued under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(with = "field::decimal_u64")]
    pub version: u64,
    #[serde(rename = "type", with = "field::decimal")]
    pub tp: BigUint,
    #[serde(with = "field::decimal")]
    pub context: BigUint,
    #[serde(with = "field::decimal")]
    pub id: BigUint,
}

impl Header {
    /// Create a new header at the current version.
    pub fn new(tp: BigUint, context: BigUint, id: BigUint) -> Self {
        Self {
            version: CREDENTIAL_VERSION,
            tp,
            context,
            id,
        }
    }
}
