//! Blind issuance: the spender blinds a coin, the bank signs it blind, the
//! spender unblinds and checks the result.

use rand::{CryptoRng, RngCore};

use crate::crypto::{
    self, BankKey, BankPublicKey, BlindSignature, BlindedMessage, BlindingFactor, Signature,
};
use crate::error::{PiggybankError, Result};

/// Spender side: blind a coin's canonical encoding for the bank
pub fn blind_coin<R: RngCore + CryptoRng>(
    canonical: &str,
    bank_key: &BankPublicKey,
    rng: &mut R,
) -> Result<(BlindedMessage, BlindingFactor)> {
    crypto::blind(canonical.as_bytes(), bank_key, rng)
}

/// Bank side: sign a blinded coin. Its content cannot be inspected.
pub fn sign_blinded(blinded: &BlindedMessage, bank_key: &BankKey) -> Result<BlindSignature> {
    let signature = bank_key.sign(blinded)?;
    tracing::debug!("Signed blinded coin ({} bytes)", blinded.0.len());
    Ok(signature)
}

/// Spender side: unblind the bank's answer and make sure it signs `canonical`
pub fn finalize(
    blind_signature: &BlindSignature,
    factor: &BlindingFactor,
    canonical: &str,
    bank_key: &BankPublicKey,
) -> Result<Signature> {
    let signature = crypto::unblind(blind_signature, factor, bank_key)?;
    if !crypto::verify(&signature, canonical.as_bytes(), bank_key) {
        return Err(PiggybankError::SigningFailure(
            "unblinded signature does not verify against the coin".to_string(),
        ));
    }
    Ok(signature)
}
