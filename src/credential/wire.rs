//! Canonical JSON encoding of credentials.
//!
//! Integers travel as decimal strings, keys and signatures as base64. The
//! body is keyed by claim name; `attachments` is omitted when empty.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::credential::{Body, Credential};
use super::header::Header;
use super::signature::Signature;
use crate::claim::ClaimValue;
use crate::error::{Error, Result};
use crate::types::CredType;

#[derive(Serialize, Deserialize)]
struct WireCredential {
    header: Header,
    body: Map<String, Value>,
    signatures: Vec<Signature>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attachments: BTreeMap<String, String>,
}

impl Credential {
    /// Canonical JSON value of the credential.
    pub fn to_json(&self) -> Result<Value> {
        let mut body = Map::new();
        for (claim, value) in self.body.tp().claims().iter().zip(self.body.values()) {
            body.insert(claim.name.clone(), value.to_json());
        }
        let wire = WireCredential {
            header: self.header.clone(),
            body,
            signatures: self.signatures.clone(),
            attachments: self.attachments.clone(),
        };
        serde_json::to_value(wire).map_err(|e| Error::from(e).context("marshal credential"))
    }

    /// Serialize to the canonical JSON wire string.
    pub fn marshal(&self) -> Result<String> {
        let value = self.to_json()?;
        serde_json::to_string(&value).map_err(|e| Error::from(e).context("marshal credential"))
    }

    /// Decode a credential issued under `tp`; the wire type id must equal
    /// `tp`'s type id.
    pub fn unmarshal(tp: &CredType, s: &str) -> Result<Self> {
        let wire: WireCredential = serde_json::from_str(s)
            .map_err(|e| Error::InvalidCredential(format!("unmarshal credential: {e}")))?;
        Self::from_wire(tp, wire).map_err(|e| e.context("unmarshal credential"))
    }

    fn from_wire(tp: &CredType, mut wire: WireCredential) -> Result<Self> {
        if &wire.header.tp != tp.type_id() {
            return Err(Error::InvalidCredential(format!(
                "type id {} does not match expected {}",
                wire.header.tp,
                tp.type_id()
            )));
        }

        let values = tp
            .claims()
            .iter()
            .map(|claim| {
                let raw = wire.body.remove(&claim.name).ok_or_else(|| {
                    Error::InvalidCredential(format!("missing claim {}", claim.name))
                })?;
                ClaimValue::from_json(&claim.tp, &raw).map_err(|e| e.context(&claim.name))
            })
            .collect::<Result<Vec<_>>>()?;
        if let Some(extra) = wire.body.keys().next() {
            return Err(Error::InvalidCredential(format!("unknown claim {extra}")));
        }

        let mut cred = Credential::new(wire.header, Body::new(tp.clone(), values)?)?;
        cred.signatures = wire.signatures;
        cred.attachments = wire.attachments;
        Ok(cred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{SignatureMetadata, VerificationStack};
    use crate::error::ErrorKind;
    use crate::types::{parse_type, ClaimType, HashAlgorithm};
    use num_bigint::BigUint;
    use proptest::prelude::*;
    use serde_json::json;

    fn tp() -> CredType {
        parse_type("age:uint<256>;country:prop<64,keccak256,1>;vip:bool;")
            .unwrap()
            .with_type_id(BigUint::from(778u32))
    }

    fn credential(age: u64, country: &str, vip: bool) -> Credential {
        let t = tp();
        let values = vec![
            ClaimValue::scalar(&ClaimType::scalar(256).unwrap(), age).unwrap(),
            ClaimValue::prop(
                &ClaimType::property(64, HashAlgorithm::Keccak256, 1).unwrap(),
                country,
                None,
            )
            .unwrap(),
            ClaimValue::boolean(vip),
        ];
        let header = Header::new(BigUint::from(778u32), BigUint::from(3u32), BigUint::from(4u32));
        Credential::new(header, Body::new(t, values).unwrap()).unwrap()
    }

    #[test]
    fn test_wire_shape() {
        let mut cred = credential(100, "US", true);
        cred.signatures.push(Signature {
            metadata: SignatureMetadata {
                verification_stack: VerificationStack::BabyZk,
                signature_id: BigUint::from(1u32),
                expired_at: 9,
                identity_commitment: BigUint::from(2u32),
                issuer_id: BigUint::from(3u32),
                chain_id: BigUint::from(4u32),
                public_key: vec![1],
            },
            signature: vec![2],
            attachments_signature: None,
        });
        let v = cred.to_json().unwrap();
        assert_eq!(v["header"], json!({"version": "1", "type": "778", "context": "3", "id": "4"}));
        assert_eq!(v["body"]["age"], json!("100"));
        assert_eq!(v["body"]["vip"], json!("true"));
        assert_eq!(v["body"]["country"]["str"], json!("US"));
        assert!(v.get("attachments").is_none());
        assert_eq!(v["signatures"][0]["signature"], json!("Ag=="));
    }

    #[test]
    fn test_type_id_mismatch_is_error() {
        let s = credential(1, "US", false).marshal().unwrap();
        let other = tp().with_type_id(BigUint::from(779u32));
        let e = Credential::unmarshal(&other, &s).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::InvalidCredential);
        assert!(e.to_string().contains("unmarshal credential"));
    }

    #[test]
    fn test_body_must_match_type() {
        let mut v = credential(1, "US", false).to_json().unwrap();
        v["body"]["extra"] = json!("1");
        assert!(Credential::unmarshal(&tp(), &v.to_string()).is_err());

        let mut v = credential(1, "US", false).to_json().unwrap();
        v["body"].as_object_mut().unwrap().remove("vip");
        assert!(Credential::unmarshal(&tp(), &v.to_string()).is_err());

        let mut v = credential(1, "US", false).to_json().unwrap();
        v["body"]["age"] = json!(1);
        assert_eq!(
            Credential::unmarshal(&tp(), &v.to_string()).unwrap_err().kind(),
            ErrorKind::InvalidClaimValue
        );
    }

    proptest! {
        #[test]
        fn marshal_round_trip(
            age in any::<u64>(),
            country in "[A-Za-z ]{0,12}",
            vip in any::<bool>(),
            attachments in proptest::collection::btree_map("[a-z]{1,6}", "[ -~]{0,10}", 0..3),
        ) {
            let cred = credential(age, &country, vip).with_attachments(attachments);
            let back = Credential::unmarshal(&tp(), &cred.marshal().unwrap()).unwrap();
            prop_assert_eq!(back, cred);
        }
    }
}
