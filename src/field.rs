//! BN254 scalar field helpers: integer conversions, limbs and masks.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::error::{Error, Result};

/// Width of one limb of a 256-bit scalar.
pub const LIMB_BITS: u32 = 128;

/// Bytes packed into one field element when hashing strings.
const PACK_CHUNK: usize = 31;

/// The BN254 scalar field modulus.
pub fn field_modulus() -> BigUint {
    BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
}

/// `2^bits`.
pub fn pow2(bits: u32) -> BigUint {
    BigUint::one() << bits
}

/// `2^bits - 1`.
pub fn mask(bits: u32) -> BigUint {
    pow2(bits) - BigUint::one()
}

/// Split a 256-bit value into `[msb, lsb]` 128-bit limbs.
pub fn split_u256(value: &BigUint) -> [BigUint; 2] {
    [value >> LIMB_BITS, value & mask(LIMB_BITS)]
}

/// Inverse of [`split_u256`].
pub fn join_u256(msb: &BigUint, lsb: &BigUint) -> BigUint {
    (msb << LIMB_BITS) + lsb
}

/// Convert an integer to a field element, rejecting values that would wrap.
pub fn to_field(value: &BigUint) -> Result<Fr> {
    if value >= &field_modulus() {
        return Err(Error::InvalidClaimValue(format!(
            "{value} is not a field element"
        )));
    }
    Ok(Fr::from_le_bytes_mod_order(&value.to_bytes_le()))
}

/// Reduce an integer into the field. Callers guarantee the value is in range.
pub fn reduce(value: &BigUint) -> Fr {
    Fr::from_le_bytes_mod_order(&value.to_bytes_le())
}

/// Canonical integer representative of a field element.
pub fn from_field(f: &Fr) -> BigUint {
    BigUint::from_bytes_le(&f.into_bigint().to_bytes_le())
}

/// Parse a strictly decimal, unsigned integer (no sign, no whitespace).
pub fn parse_decimal(s: &str) -> Result<BigUint> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Serialization(format!(
            "expected decimal integer string, got {s:?}"
        )));
    }
    s.parse::<BigUint>()
        .map_err(|e| Error::Serialization(format!("{s:?}: {e}")))
}

/// Pack bytes into field elements, 31 big-endian bytes per element.
///
/// The byte length is appended so that inputs differing only in trailing
/// zero bytes do not collide.
pub fn pack_bytes(bytes: &[u8]) -> Vec<Fr> {
    let mut out: Vec<Fr> = bytes
        .chunks(PACK_CHUNK)
        .map(Fr::from_be_bytes_mod_order)
        .collect();
    out.push(Fr::from(bytes.len() as u64));
    out
}

/// Zero element, used as the digest of an empty sequence.
pub fn zero() -> Fr {
    Fr::zero()
}

/// Serde adapter for integers carried as decimal strings.
pub mod decimal {
    use num_bigint::BigUint;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(d)?;
        super::parse_decimal(&s).map_err(D::Error::custom)
    }
}

/// Serde adapter for lists of decimal-string integers.
pub mod decimal_vec {
    use num_bigint::BigUint;
    use serde::{de::Error as _, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[BigUint], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(values.len()))?;
        for v in values {
            seq.serialize_element(&v.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<BigUint>, D::Error> {
        Vec::<String>::deserialize(d)?
            .iter()
            .map(|s| super::parse_decimal(s).map_err(D::Error::custom))
            .collect()
    }
}

/// Serde adapter for `u64` carried as a decimal string.
pub mod decimal_u64 {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let s = String::deserialize(d)?;
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(D::Error::custom(format!("expected decimal string, got {s:?}")));
        }
        s.parse::<u64>().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_join_u256() {
        let v = (BigUint::from(7u32) << 128u32) + BigUint::from(100u32);
        let [msb, lsb] = split_u256(&v);
        assert_eq!(msb, BigUint::from(7u32));
        assert_eq!(lsb, BigUint::from(100u32));
        assert_eq!(join_u256(&msb, &lsb), v);
    }

    #[test]
    fn test_field_conversion_rejects_modulus() {
        let p = field_modulus();
        assert!(to_field(&p).is_err());
        let max = &p - BigUint::one();
        assert_eq!(from_field(&to_field(&max).unwrap()), max);
    }

    #[test]
    fn test_parse_decimal_strict() {
        assert_eq!(parse_decimal("0042").unwrap(), BigUint::from(42u32));
        assert!(parse_decimal("+4").is_err());
        assert!(parse_decimal(" 4").is_err());
        assert!(parse_decimal("").is_err());
        assert!(parse_decimal("0x10").is_err());
    }

    #[test]
    fn test_pack_bytes_length_suffix() {
        assert_ne!(pack_bytes(b"ab"), pack_bytes(b"ab\0"));
        assert_eq!(pack_bytes(&[]).len(), 1);
        assert_eq!(pack_bytes(&[1u8; 62]).len(), 3);
    }
}
