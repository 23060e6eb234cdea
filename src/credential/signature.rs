//! Signature metadata and issued signatures.

use std::fmt;

use num_bigint::BigUint;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::field;

/// Proving stack a signature was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationStack {
    BabyZk,
}

impl VerificationStack {
    /// Numeric code, hashed into the credential digest.
    pub fn code(&self) -> u64 {
        match self {
            VerificationStack::BabyZk => 1,
        }
    }

    /// Look up a stack by its wire code.
    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            1 => Ok(VerificationStack::BabyZk),
            other => Err(Error::InvalidCredential(format!(
                "unknown verification stack {other}"
            ))),
        }
    }
}

impl fmt::Display for VerificationStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationStack::BabyZk => f.write_str("babyzk"),
        }
    }
}

impl Serialize for VerificationStack {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.code().to_string())
    }
}

impl<'de> Deserialize<'de> for VerificationStack {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let code = field::decimal_u64::deserialize(d)?;
        VerificationStack::from_code(code).map_err(D::Error::custom)
    }
}

/// What the issuer commits to alongside the credential body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureMetadata {
    pub verification_stack: VerificationStack,
    /// Nonzero; for revocable types also the revocation tree leaf index.
    #[serde(with = "field::decimal")]
    pub signature_id: BigUint,
    #[serde(with = "field::decimal_u64")]
    pub expired_at: u64,
    #[serde(with = "field::decimal")]
    pub identity_commitment: BigUint,
    #[serde(with = "field::decimal")]
    pub issuer_id: BigUint,
    #[serde(with = "field::decimal")]
    pub chain_id: BigUint,
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub metadata: SignatureMetadata,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    #[serde(
        rename = "attachmentsSignature",
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_opt"
    )]
    pub attachments_signature: Option<Vec<u8>>,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        STANDARD.decode(s).map_err(D::Error::custom)
    }
}

mod base64_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => super::base64_bytes::serialize(b, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(with = "super::base64_bytes")] Vec<u8>);
        Ok(Option::<Wrapped>::deserialize(d)?.map(|w| w.0))
    }
}
