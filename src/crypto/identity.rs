//! Identity commitments: the spender's identity split into XOR shares
//!
//! For every trial `i` the spender draws a random `left[i]` and sets
//! `right[i] = left[i] ^ (IDENT_PREFIX || identity || 0..)`. Either half on its
//! own is uniformly random; both halves of one trial give back the identity.
//! Only the Blake2b hashes of the halves travel with the coin.

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{PiggybankError, Result};
use crate::types::{Hash, Identity, Secret, Side};

/// Marker in front of the identity inside every split plaintext
pub const IDENT_PREFIX: &[u8] = b"IDENT:";

/// Both halves of every trial, held by the spender for the coin's lifetime
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySecrets {
    left: Vec<Secret>,
    right: Vec<Secret>,
}

/// Public hash commitments to the secrets
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityCommitments {
    pub left_hashes: Vec<Hash>,
    pub right_hashes: Vec<Hash>,
}

/// Split `identity` into `trials` pairs of secrets of `secret_len` bytes and
/// commit to each half.
pub fn build<R: RngCore + CryptoRng>(
    identity: &Identity,
    trials: usize,
    secret_len: usize,
    rng: &mut R,
) -> Result<(IdentitySecrets, IdentityCommitments)> {
    if trials == 0 {
        return Err(PiggybankError::InvalidConfig(
            "a coin needs at least one trial".to_string(),
        ));
    }
    let plaintext = encode_identity(identity, secret_len)?;

    let mut left = Vec::with_capacity(trials);
    let mut right = Vec::with_capacity(trials);
    for _ in 0..trials {
        let mut share = vec![0u8; secret_len];
        rng.fill_bytes(&mut share);
        let other = share.iter().zip(&plaintext).map(|(a, b)| a ^ b).collect();
        left.push(Secret(share));
        right.push(Secret(other));
    }

    let commitments = IdentityCommitments {
        left_hashes: left.iter().map(Secret::hash).collect(),
        right_hashes: right.iter().map(Secret::hash).collect(),
    };

    Ok((IdentitySecrets { left, right }, commitments))
}

/// `IDENT_PREFIX || identity`, zero padded to `secret_len`
pub fn encode_identity(identity: &Identity, secret_len: usize) -> Result<Vec<u8>> {
    let name = identity.as_bytes();
    if name.is_empty() {
        return Err(PiggybankError::InvalidIdentity(
            "identity must not be empty".to_string(),
        ));
    }
    if name.contains(&0) {
        return Err(PiggybankError::InvalidIdentity(format!(
            "{:?} contains a NUL byte",
            identity.0
        )));
    }
    if IDENT_PREFIX.len() + name.len() > secret_len {
        return Err(PiggybankError::InvalidIdentity(format!(
            "{:?} is {} bytes, at most {} fit",
            identity.0,
            name.len(),
            secret_len.saturating_sub(IDENT_PREFIX.len())
        )));
    }

    let mut plaintext = Vec::with_capacity(secret_len);
    plaintext.extend_from_slice(IDENT_PREFIX);
    plaintext.extend_from_slice(name);
    plaintext.resize(secret_len, 0);
    Ok(plaintext)
}

/// Read an identity back out of a recombined plaintext.
///
/// Returns `None` when the plaintext does not start with `IDENT_PREFIX`.
pub fn decode_identity(plaintext: &[u8]) -> Option<std::result::Result<Identity, String>> {
    let body = plaintext.strip_prefix(IDENT_PREFIX)?;
    let end = body.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    Some(
        String::from_utf8(body[..end].to_vec())
            .map(Identity)
            .map_err(|e| e.to_string()),
    )
}

impl IdentitySecrets {
    pub fn trials(&self) -> usize {
        self.left.len()
    }

    /// Secret for `side` of trial `index`
    pub fn reveal(&self, side: Side, index: usize) -> Result<&Secret> {
        let halves = match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        };
        halves.get(index).ok_or(PiggybankError::OutOfRangeTrial {
            index,
            trials: self.trials(),
        })
    }
}

impl IdentityCommitments {
    pub fn trials(&self) -> usize {
        self.left_hashes.len()
    }

    pub fn hashes(&self, side: Side) -> &[Hash] {
        match side {
            Side::Left => &self.left_hashes,
            Side::Right => &self.right_hashes,
        }
    }
}
