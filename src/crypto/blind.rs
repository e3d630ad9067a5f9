//! RSA blind signatures (Chaum)
//!
//! The message representative is `SHA-256(message)` read as a big-endian
//! integer. The spender blinds it as `m * r^e mod n`, the bank signs the
//! blinded value with `d`, and the spender strips `r` off the result.

use num_bigint_dig::{BigInt, BigUint, ModInverse, Sign, ToBigUint};
use rand::{CryptoRng, RngCore};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::config::MIN_KEY_BITS;
use crate::error::{PiggybankError, Result};

use super::types::{BankPublicKey, BlindSignature, BlindedMessage, BlindingFactor, Signature};

/// Bank signing key. Constructed explicitly and handed to whoever signs.
#[derive(Clone)]
pub struct BankKey {
    n: BigUint,
    e: BigUint,
    d: BigUint,
}

impl fmt::Debug for BankKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankKey")
            .field("bits", &self.n.bits())
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}

impl BankKey {
    /// Generate a fresh RSA key pair
    pub fn generate<R: RngCore + CryptoRng>(bits: usize, rng: &mut R) -> Result<Self> {
        let key = RsaPrivateKey::new(rng, bits)
            .map_err(|e| PiggybankError::KeyGeneration(e.to_string()))?;

        Ok(Self {
            n: key.n().clone(),
            e: key.e().clone(),
            d: key.d().clone(),
        })
    }

    pub fn public_key(&self) -> BankPublicKey {
        BankPublicKey {
            n: self.n.to_bytes_be(),
            e: self.e.to_bytes_be(),
        }
    }

    /// Sign a blinded message without learning what it hides
    pub fn sign(&self, blinded: &BlindedMessage) -> Result<BlindSignature> {
        let value = blinded.to_biguint();
        if value >= self.n {
            return Err(PiggybankError::SigningFailure(
                "blinded message exceeds the bank modulus".to_string(),
            ));
        }
        Ok(BlindSignature::from_biguint(&value.modpow(&self.d, &self.n)))
    }
}

/// Integer the bank ends up signing for `message`
pub fn message_representative(message: &[u8]) -> BigUint {
    BigUint::from_bytes_be(&Sha256::digest(message))
}

/// Blind `message` for the holder of `key`
pub fn blind<R: RngCore + CryptoRng>(
    message: &[u8],
    key: &BankPublicKey,
    rng: &mut R,
) -> Result<(BlindedMessage, BlindingFactor)> {
    let n = key.modulus();
    let e = key.exponent();
    check_public_key(&n, &e)?;
    let m = message_representative(message) % &n;

    let r = loop {
        let candidate = random_below(&n, rng);
        if candidate > BigUint::from(1u32) && mod_inverse(&candidate, &n).is_some() {
            break candidate;
        }
    };

    let blinded = (m * r.modpow(&e, &n)) % &n;
    Ok((BlindedMessage::from_biguint(&blinded), BlindingFactor(r)))
}

/// Remove the blinding factor from the bank's signature
pub fn unblind(
    blind_signature: &BlindSignature,
    factor: &BlindingFactor,
    key: &BankPublicKey,
) -> Result<Signature> {
    let n = key.modulus();
    check_public_key(&n, &key.exponent())?;
    let r_inv = mod_inverse(&factor.0, &n).ok_or_else(|| {
        PiggybankError::SigningFailure("blinding factor not invertible".to_string())
    })?;
    let signature = (blind_signature.to_biguint() * r_inv) % &n;
    Ok(Signature::from_biguint(&signature))
}

/// Check `signature` is the bank's signature over `message`
pub fn verify(signature: &Signature, message: &[u8], key: &BankPublicKey) -> bool {
    let n = key.modulus();
    if check_public_key(&n, &key.exponent()).is_err() {
        return false;
    }
    let s = signature.to_biguint();
    if s >= n {
        return false;
    }
    s.modpow(&key.exponent(), &n) == message_representative(message) % &n
}

/// Reject public keys no honest bank could have produced
fn check_public_key(n: &BigUint, e: &BigUint) -> Result<()> {
    if n.bits() < MIN_KEY_BITS {
        return Err(PiggybankError::InvalidConfig(format!(
            "bank modulus is {} bits, minimum {}",
            n.bits(),
            MIN_KEY_BITS
        )));
    }
    if n.to_bytes_be().last().map_or(true, |b| b & 1 == 0) {
        return Err(PiggybankError::InvalidConfig(
            "bank modulus is even".to_string(),
        ));
    }
    if *e <= BigUint::from(1u32) {
        return Err(PiggybankError::InvalidConfig(format!(
            "bank exponent {} is degenerate",
            e
        )));
    }
    Ok(())
}

fn random_below<R: RngCore + CryptoRng>(n: &BigUint, rng: &mut R) -> BigUint {
    // 64 extra bits keep the modulo bias negligible
    let mut bytes = vec![0u8; (n.bits() + 7) / 8 + 8];
    rng.fill_bytes(&mut bytes);
    BigUint::from_bytes_be(&bytes) % n
}

fn mod_inverse(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    let inverse: BigInt = a.clone().mod_inverse(n)?;
    let n = BigInt::from_biguint(Sign::Plus, n.clone());
    (((inverse % &n) + &n) % &n).to_biguint()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::test_key;

    #[test]
    fn test_blind_sign_unblind_verifies() {
        let key = test_key();
        let public = key.public_key();
        let mut rng = rand::thread_rng();
        let message = b"ELECTRONIC_PIGGYBANK-20-guid-a-b";

        let (blinded, factor) = blind(message, &public, &mut rng).unwrap();
        let blind_sig = key.sign(&blinded).unwrap();
        let signature = unblind(&blind_sig, &factor, &public).unwrap();

        assert!(verify(&signature, message, &public));
        assert!(!verify(&signature, b"some other message", &public));
    }

    #[test]
    fn test_blinding_hides_message() {
        let public = test_key().public_key();
        let mut rng = rand::thread_rng();
        let message = b"same message";

        let (blinded1, _) = blind(message, &public, &mut rng).unwrap();
        let (blinded2, _) = blind(message, &public, &mut rng).unwrap();

        assert_ne!(blinded1, blinded2);
        assert_ne!(
            blinded1.to_biguint(),
            message_representative(message)
        );
    }

    #[test]
    fn test_wrong_blinding_factor_fails_verification() {
        let key = test_key();
        let public = key.public_key();
        let mut rng = rand::thread_rng();
        let message = b"coin";

        let (blinded, _) = blind(message, &public, &mut rng).unwrap();
        let (_, other_factor) = blind(message, &public, &mut rng).unwrap();
        let blind_sig = key.sign(&blinded).unwrap();
        let signature = unblind(&blind_sig, &other_factor, &public).unwrap();

        assert!(!verify(&signature, message, &public));
    }

    #[test]
    fn test_sign_rejects_oversized_blinded_message() {
        let key = test_key();
        let oversized = BlindedMessage(vec![0xff; key.public_key().n.len() + 1]);
        assert!(matches!(
            key.sign(&oversized),
            Err(PiggybankError::SigningFailure(_))
        ));
    }

    #[test]
    fn test_verify_rejects_signature_above_modulus() {
        let public = test_key().public_key();
        let huge = Signature(vec![0xff; public.n.len() + 1]);
        assert!(!verify(&huge, b"coin", &public));
    }

    #[test]
    fn test_degenerate_public_keys_rejected() {
        let mut rng = rand::thread_rng();
        let good = test_key().public_key();
        let degenerate = [
            BankPublicKey { n: vec![], e: good.e.clone() },
            BankPublicKey { n: vec![2], e: good.e.clone() },
            BankPublicKey { n: vec![0xff; 16], e: good.e.clone() },
            BankPublicKey {
                n: [good.n[..good.n.len() - 1].to_vec(), vec![0xfe]].concat(),
                e: good.e.clone(),
            },
            BankPublicKey { n: good.n.clone(), e: vec![1] },
            BankPublicKey { n: good.n.clone(), e: vec![] },
        ];

        for key in &degenerate {
            assert!(matches!(
                blind(b"coin", key, &mut rng),
                Err(PiggybankError::InvalidConfig(_))
            ));
            assert!(!verify(&Signature(vec![]), b"coin", key));
        }

        let (_, factor) = blind(b"coin", &good, &mut rng).unwrap();
        assert!(matches!(
            unblind(&BlindSignature(vec![1]), &factor, &degenerate[1]),
            Err(PiggybankError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_mod_inverse() {
        let n = BigUint::from(97u32);
        let a = BigUint::from(15u32);
        let inv = mod_inverse(&a, &n).unwrap();
        assert_eq!((a * inv) % n, BigUint::from(1u32));

        assert!(mod_inverse(&BigUint::from(6u32), &BigUint::from(9u32)).is_none());
    }

    #[test]
    fn test_debug_hides_private_exponent() {
        let rendered = format!("{:?}", test_key());
        assert!(rendered.starts_with("BankKey"));
        assert!(!rendered.contains(" d:"));
    }
}
