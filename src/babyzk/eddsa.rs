//! EdDSA over Baby Jubjub with a Poseidon challenge.
//!
//! Keys and signatures use compressed point encodings:
//! public key = `A` (32 bytes), signature = `R` (32 bytes) || `S` (32 bytes, LE).
//! Signatures verify iff `S·G == R + H(R, A, msg)·A`.

use ark_bn254::Fr;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, Fr as Scalar};
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};

use crate::error::{Error, Result};
use crate::field::from_field;
use crate::poseidon::SpongeHasher;

pub const PRIVATE_KEY_LEN: usize = 32;
pub const POINT_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 2 * POINT_LEN;

/// Fresh random private key.
pub fn generate_private_key<R: RngCore + CryptoRng>(rng: &mut R) -> [u8; PRIVATE_KEY_LEN] {
    let mut sk = [0u8; PRIVATE_KEY_LEN];
    rng.fill_bytes(&mut sk);
    sk
}

/// Expanded private key.
pub struct SigningKey {
    scalar: Scalar,
    prefix: [u8; 32],
}

impl SigningKey {
    /// Expand a 32-byte private key.
    pub fn from_bytes(private_key: &[u8]) -> Result<Self> {
        if private_key.len() != PRIVATE_KEY_LEN {
            return Err(Error::InvalidSignature(format!(
                "private key must be {PRIVATE_KEY_LEN} bytes, got {}",
                private_key.len()
            )));
        }
        let digest = Sha512::digest(private_key);
        let mut prefix = [0u8; 32];
        prefix.copy_from_slice(&digest[32..]);
        Ok(Self {
            scalar: Scalar::from_le_bytes_mod_order(&digest[..32]),
            prefix,
        })
    }

    /// Get the public point `A = s * G`.
    pub fn public_key(&self) -> EdwardsAffine {
        (EdwardsAffine::generator() * self.scalar).into_affine()
    }

    /// Compressed public key bytes.
    pub fn public_key_bytes(&self) -> Result<Vec<u8>> {
        encode_point(&self.public_key())
    }

    /// Deterministic signature over a field element.
    pub fn sign(&self, hasher: &dyn SpongeHasher, msg: &Fr) -> Result<Vec<u8>> {
        let msg_bytes = msg.into_bigint().to_bytes_le();
        let nonce = Sha512::new()
            .chain_update(self.prefix)
            .chain_update(&msg_bytes)
            .finalize();
        let r = Scalar::from_le_bytes_mod_order(&nonce);
        let big_r = (EdwardsAffine::generator() * r).into_affine();
        let h = challenge(hasher, &big_r, &self.public_key(), msg)?;
        let s = r + h * self.scalar;

        let mut out = encode_point(&big_r)?;
        out.extend(s.into_bigint().to_bytes_le());
        Ok(out)
    }
}

/// Compress a point to 32 bytes.
pub fn encode_point(p: &EdwardsAffine) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(POINT_LEN);
    p.serialize_compressed(&mut out)
        .map_err(|e| Error::InternalError(format!("point encoding: {e}")))?;
    Ok(out)
}

/// Decode a compressed point; rejects points off the curve or outside the
/// prime-order subgroup.
pub fn decode_point(bytes: &[u8]) -> Option<EdwardsAffine> {
    if bytes.len() != POINT_LEN {
        return None;
    }
    EdwardsAffine::deserialize_compressed(bytes).ok()
}

fn decode_scalar(bytes: &[u8]) -> Option<Scalar> {
    let n = BigUint::from_bytes_le(bytes);
    if n >= BigUint::from_bytes_le(&Scalar::MODULUS.to_bytes_le()) {
        return None;
    }
    Some(Scalar::from_le_bytes_mod_order(bytes))
}

fn challenge(hasher: &dyn SpongeHasher, r: &EdwardsAffine, a: &EdwardsAffine, msg: &Fr) -> Result<Scalar> {
    let h = hasher.hash(&[r.x, r.y, a.x, a.y, *msg])?;
    Ok(Scalar::from_le_bytes_mod_order(&h.into_bigint().to_bytes_le()))
}

/// Decoded signature: `R`, `S` and the signer's `A`.
#[derive(Debug, Clone)]
pub struct SignatureParts {
    pub a: EdwardsAffine,
    pub r: EdwardsAffine,
    pub s: Scalar,
}

impl SignatureParts {
    /// Split a signature into `R` and `S` and decode the signer's key.
    pub fn decode(signature: &[u8], public_key: &[u8]) -> Result<Self> {
        if signature.len() != SIGNATURE_LEN {
            return Err(Error::InvalidSignature(format!(
                "signature must be {SIGNATURE_LEN} bytes, got {}",
                signature.len()
            )));
        }
        let a = decode_point(public_key)
            .ok_or_else(|| Error::InvalidSignature("malformed public key".into()))?;
        let r = decode_point(&signature[..POINT_LEN])
            .ok_or_else(|| Error::InvalidSignature("malformed R point".into()))?;
        let s = decode_scalar(&signature[POINT_LEN..])
            .ok_or_else(|| Error::InvalidSignature("S is not reduced".into()))?;
        Ok(Self { a, r, s })
    }

    /// `(Ax, Ay, R8x, R8y, S)` as circuit inputs.
    pub fn signals(&self) -> [BigUint; 5] {
        [
            from_field(&self.a.x),
            from_field(&self.a.y),
            from_field(&self.r.x),
            from_field(&self.r.y),
            BigUint::from_bytes_le(&self.s.into_bigint().to_bytes_le()),
        ]
    }
}

/// Check a signature; malformed input is `false`.
pub fn verify(hasher: &dyn SpongeHasher, msg: &Fr, signature: &[u8], public_key: &[u8]) -> bool {
    let Ok(parts) = SignatureParts::decode(signature, public_key) else {
        return false;
    };
    let Ok(h) = challenge(hasher, &parts.r, &parts.a, msg) else {
        return false;
    };
    let lhs = EdwardsAffine::generator() * parts.s;
    let rhs = parts.r.into_group() + parts.a * h;
    lhs == rhs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poseidon::PoseidonHasher;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sign_verify() {
        let hasher = PoseidonHasher::new();
        let mut rng = StdRng::seed_from_u64(7);
        let key = SigningKey::from_bytes(&generate_private_key(&mut rng)).unwrap();
        let pk = key.public_key_bytes().unwrap();
        assert_eq!(pk.len(), POINT_LEN);

        let msg = Fr::from(12345u64);
        let sig = key.sign(&hasher, &msg).unwrap();
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert!(verify(&hasher, &msg, &sig, &pk));
        assert!(!verify(&hasher, &Fr::from(12346u64), &sig, &pk));

        let other = SigningKey::from_bytes(&[9u8; 32]).unwrap();
        assert!(!verify(&hasher, &msg, &sig, &other.public_key_bytes().unwrap()));
    }

    #[test]
    fn test_deterministic() {
        let hasher = PoseidonHasher::new();
        let key = SigningKey::from_bytes(&[1u8; 32]).unwrap();
        let msg = Fr::from(5u64);
        assert_eq!(key.sign(&hasher, &msg).unwrap(), key.sign(&hasher, &msg).unwrap());
    }

    #[test]
    fn test_malformed_inputs_do_not_verify() {
        let hasher = PoseidonHasher::new();
        let key = SigningKey::from_bytes(&[3u8; 32]).unwrap();
        let pk = key.public_key_bytes().unwrap();
        let msg = Fr::from(1u64);
        let mut sig = key.sign(&hasher, &msg).unwrap();
        assert!(!verify(&hasher, &msg, &sig[..63], &pk));
        assert!(!verify(&hasher, &msg, &sig, &pk[..31]));
        sig[63] = 0xff;
        assert!(!verify(&hasher, &msg, &sig, &pk));
        assert!(SigningKey::from_bytes(&[0u8; 31]).is_err());
    }

    #[test]
    fn test_signal_decomposition() {
        let hasher = PoseidonHasher::new();
        let key = SigningKey::from_bytes(&[4u8; 32]).unwrap();
        let sig = key.sign(&hasher, &Fr::from(2u64)).unwrap();
        let parts = SignatureParts::decode(&sig, &key.public_key_bytes().unwrap()).unwrap();
        let [ax, ay, ..] = parts.signals();
        assert_eq!(ax, from_field(&key.public_key().x));
        assert_eq!(ay, from_field(&key.public_key().y));
    }
}
