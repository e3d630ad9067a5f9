//! Coins and their canonical encoding
//!
//! Wire format: `<marker>-<amount>-<guid>-<lh_0>,...,<lh_k>-<rh_0>,...,<rh_k>`

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::config::ProtocolConfig;
use crate::crypto::{
    self, identity, BankPublicKey, BlindSignature, BlindedMessage, BlindingFactor,
    IdentityCommitments, IdentitySecrets, Signature,
};
use crate::error::{PiggybankError, Result};
use crate::issuance;
use crate::types::{CoinId, Hash, Identity, Secret, Side};

const FIELD_DELIMITER: char = '-';
const LIST_DELIMITER: char = ',';

/// A coin as held by its spender.
///
/// This is the spender's wallet record: its serde form carries the owner's
/// identity and both halves of every trial, so it never leaves the spender.
/// Merchants and the bank only ever see the canonical encoding, the
/// signature and one side of secrets, bundled in a `Receipt`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Coin {
    identity_owner: Identity,
    bank_marker: String,
    amount: u64,
    guid: CoinId,
    commitments: IdentityCommitments,
    secrets: IdentitySecrets,
    bank_key: BankPublicKey,
    blinded_message: Option<BlindedMessage>,
    #[serde(skip)]
    blinding_factor: Option<BlindingFactor>,
    signature: Option<Signature>,
}

/// The public fields of a coin, as recovered from its canonical encoding
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinHeader {
    pub bank_marker: String,
    pub amount: u64,
    pub guid: CoinId,
    pub left_hashes: Vec<Hash>,
    pub right_hashes: Vec<Hash>,
}

impl Coin {
    /// Mint a coin for `identity_owner` and blind it for the bank
    pub fn construct<R: RngCore + CryptoRng>(
        identity_owner: Identity,
        amount: u64,
        bank_key: &BankPublicKey,
        config: &ProtocolConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        if amount == 0 {
            return Err(PiggybankError::InvalidAmount(amount));
        }

        let guid = CoinId::generate(rng);
        let (secrets, commitments) =
            identity::build(&identity_owner, config.trials, config.secret_len, rng)?;

        let mut coin = Self {
            identity_owner,
            bank_marker: config.bank_marker.clone(),
            amount,
            guid,
            commitments,
            secrets,
            bank_key: bank_key.clone(),
            blinded_message: None,
            blinding_factor: None,
            signature: None,
        };

        let (blinded, factor) = issuance::blind_coin(&coin.canonical_encoding(), bank_key, rng)?;
        coin.blinded_message = Some(blinded);
        coin.blinding_factor = Some(factor);

        tracing::info!(
            "Minted coin {} worth {} with {} trials",
            coin.guid,
            coin.amount,
            coin.trials()
        );

        Ok(coin)
    }

    /// Deterministic string the bank signs and merchants verify
    pub fn canonical_encoding(&self) -> String {
        self.header().to_canonical_string()
    }

    /// Unblind the bank's signature and store it. The coin is spendable
    /// only once this succeeds.
    pub fn finalize_signature(&mut self, blind_signature: &BlindSignature) -> Result<()> {
        let factor = self.blinding_factor.as_ref().ok_or_else(|| {
            PiggybankError::SigningFailure(format!(
                "coin {} has no pending blinding factor",
                self.guid
            ))
        })?;

        let signature =
            issuance::finalize(blind_signature, factor, &self.canonical_encoding(), &self.bank_key)?;

        self.signature = Some(signature);
        self.blinded_message = None;
        self.blinding_factor = None;

        tracing::info!("Coin {} issued", self.guid);
        Ok(())
    }

    /// Secret for `side` of trial `trial_index`
    pub fn reveal(&self, side: Side, trial_index: usize) -> Result<Secret> {
        if self.signature.is_none() {
            return Err(PiggybankError::CoinNotIssued(self.guid.to_string()));
        }
        self.secrets.reveal(side, trial_index).cloned()
    }

    /// Check the stored signature against `key`
    pub fn verify(&self, key: &BankPublicKey) -> bool {
        match &self.signature {
            Some(signature) => {
                crypto::verify(signature, self.canonical_encoding().as_bytes(), key)
            }
            None => false,
        }
    }

    pub fn header(&self) -> CoinHeader {
        CoinHeader {
            bank_marker: self.bank_marker.clone(),
            amount: self.amount,
            guid: self.guid.clone(),
            left_hashes: self.commitments.left_hashes.clone(),
            right_hashes: self.commitments.right_hashes.clone(),
        }
    }

    pub fn identity_owner(&self) -> &Identity {
        &self.identity_owner
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn guid(&self) -> &CoinId {
        &self.guid
    }

    pub fn trials(&self) -> usize {
        self.commitments.trials()
    }

    pub fn left_hashes(&self) -> &[Hash] {
        &self.commitments.left_hashes
    }

    pub fn right_hashes(&self) -> &[Hash] {
        &self.commitments.right_hashes
    }

    pub fn blinded_message(&self) -> Option<&BlindedMessage> {
        self.blinded_message.as_ref()
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn is_issued(&self) -> bool {
        self.signature.is_some()
    }

    #[cfg(test)]
    pub(crate) fn set_signature(&mut self, signature: Signature) {
        self.signature = Some(signature);
    }
}

impl CoinHeader {
    pub fn to_canonical_string(&self) -> String {
        format!(
            "{}{d}{}{d}{}{d}{}{d}{}",
            self.bank_marker,
            self.amount,
            self.guid,
            join_hashes(&self.left_hashes),
            join_hashes(&self.right_hashes),
            d = FIELD_DELIMITER
        )
    }

    pub fn trials(&self) -> usize {
        self.left_hashes.len()
    }

    pub fn hashes(&self, side: Side) -> &[Hash] {
        match side {
            Side::Left => &self.left_hashes,
            Side::Right => &self.right_hashes,
        }
    }

    /// Parse a canonical coin string issued under `expected_marker`
    pub fn parse(s: &str, expected_marker: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(FIELD_DELIMITER).collect();

        let received = fields.first().copied().unwrap_or_default();
        if received != expected_marker {
            return Err(PiggybankError::MarkerMismatch {
                received: received.to_string(),
                expected: expected_marker.to_string(),
            });
        }

        if fields.len() != 5 {
            return Err(PiggybankError::MalformedCoin(format!(
                "expected 5 fields, found {}",
                fields.len()
            )));
        }

        let amount: u64 = fields[1]
            .parse()
            .map_err(|_| PiggybankError::MalformedCoin(format!("bad amount: {}", fields[1])))?;
        if amount == 0 || amount.to_string() != fields[1] {
            return Err(PiggybankError::MalformedCoin(format!(
                "bad amount: {}",
                fields[1]
            )));
        }

        let guid = CoinId::parse(fields[2])?;
        let left_hashes = parse_hashes(fields[3])?;
        let right_hashes = parse_hashes(fields[4])?;

        if left_hashes.len() != right_hashes.len() {
            return Err(PiggybankError::MalformedCoin(format!(
                "{} left hashes but {} right hashes",
                left_hashes.len(),
                right_hashes.len()
            )));
        }

        Ok(Self {
            bank_marker: received.to_string(),
            amount,
            guid,
            left_hashes,
            right_hashes,
        })
    }
}

fn join_hashes(hashes: &[Hash]) -> String {
    hashes
        .iter()
        .map(Hash::to_hex)
        .collect::<Vec<_>>()
        .join(&LIST_DELIMITER.to_string())
}

fn parse_hashes(field: &str) -> Result<Vec<Hash>> {
    field
        .split(LIST_DELIMITER)
        .map(|h| {
            Hash::from_hex(h)
                .map_err(|e| PiggybankError::MalformedCoin(format!("bad hash {:?}: {}", h, e)))
        })
        .collect()
}
