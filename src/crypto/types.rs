//! Cryptographic types for Piggybank

use num_bigint_dig::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bank's public RSA key, big-endian encoded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankPublicKey {
    pub n: Vec<u8>,
    pub e: Vec<u8>,
}

impl BankPublicKey {
    pub fn modulus(&self) -> BigUint {
        BigUint::from_bytes_be(&self.n)
    }

    pub fn exponent(&self) -> BigUint {
        BigUint::from_bytes_be(&self.e)
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.modulus().bits()
    }

    /// Short fingerprint for logs
    pub fn fingerprint(&self) -> String {
        let hash = crate::types::Hash::from_bytes(&[self.n.as_slice(), self.e.as_slice()].concat());
        hex::encode(&hash.0[..8])
    }
}

macro_rules! big_endian_value {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name(pub Vec<u8>);

        impl $name {
            pub(crate) fn from_biguint(value: &BigUint) -> Self {
                $name(value.to_bytes_be())
            }

            pub(crate) fn to_biguint(&self) -> BigUint {
                BigUint::from_bytes_be(&self.0)
            }

            /// Get value as hex string
            pub fn to_hex(&self) -> String {
                hex::encode(&self.0)
            }

            /// Create value from hex string
            pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
                Ok($name(hex::decode(hex_str)?))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }
    };
}

big_endian_value!(
    /// Canonical coin encoding after blinding; the only thing the bank sees
    BlindedMessage
);

big_endian_value!(
    /// Bank's signature over a blinded message
    BlindSignature
);

big_endian_value!(
    /// Unblinded bank signature over a coin's canonical encoding
    Signature
);

/// Blinding factor `r`; kept by the spender, never transmitted
#[derive(Clone, PartialEq, Eq)]
pub struct BlindingFactor(pub(crate) BigUint);

impl fmt::Debug for BlindingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlindingFactor(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_hex_conversion() {
        let sig = Signature(vec![1, 2, 3, 255]);
        let from_hex = Signature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(sig, from_hex);
    }

    #[test]
    fn test_biguint_conversion() {
        let value = BigUint::from(0x0102_0304u32);
        let blinded = BlindedMessage::from_biguint(&value);
        assert_eq!(blinded.0, vec![1, 2, 3, 4]);
        assert_eq!(blinded.to_biguint(), value);
    }

    #[test]
    fn test_blinding_factor_debug_hides_value() {
        let factor = BlindingFactor(BigUint::from(12345u32));
        assert_eq!(format!("{:?}", factor), "BlindingFactor(..)");
    }

    #[test]
    fn test_public_key_serialization() {
        let key = BankPublicKey {
            n: vec![0xc3; 64],
            e: vec![1, 0, 1],
        };
        let serialized = serde_json::to_string(&key).unwrap();
        let deserialized: BankPublicKey = serde_json::from_str(&serialized).unwrap();
        assert_eq!(key, deserialized);
        assert_eq!(deserialized.exponent(), BigUint::from(65537u32));
        assert_eq!(key.fingerprint().len(), 16);
    }
}
