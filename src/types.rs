//! Core types used throughout Piggybank

use blake2::{Blake2b512, Digest};
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PiggybankError, Result};

/// Globally unique coin identifier (16 random bytes, hex encoded)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinId(pub String);

impl CoinId {
    /// Number of random bytes behind a coin id
    pub const BYTES: usize = 16;

    /// Generate a fresh random coin id
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; Self::BYTES];
        rng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse a coin id received on the wire
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        if bytes.len() != Self::BYTES || s.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(PiggybankError::MalformedCoin(format!("bad guid: {}", s)));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Blake2b 256-bit hash wrapper
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Create hash from bytes using Blake2b
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(data);
        let result = hasher.finalize();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result[..32]);
        Hash(hash)
    }

    /// Get hash as hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create hash from hex string
    pub fn from_hex(hex_str: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex_str)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(Hash(hash))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Label of the legitimate spender, embedded in a coin's secrets
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which half of every trial a merchant asks the spender to open
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Draw a uniformly random side
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        if rng.gen::<bool>() {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// One half of a split identity for a single trial
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(pub Vec<u8>);

impl Secret {
    /// Commitment published on the coin for this secret
    pub fn hash(&self) -> Hash {
        Hash::from_bytes(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bytewise XOR of two secrets of equal length
    pub fn xor(&self, other: &Secret) -> Option<Vec<u8>> {
        if self.len() != other.len() {
            return None;
        }
        Some(self.0.iter().zip(&other.0).map(|(a, b)| a ^ b).collect())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}
