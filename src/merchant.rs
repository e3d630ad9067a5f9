//! Merchant side: verify a coin and challenge its spender

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::coin::Coin;
use crate::crypto::{BankPublicKey, Signature};
use crate::error::{PiggybankError, Result};
use crate::types::{CoinId, Secret, Side};

/// Secrets a spender disclosed to one merchant for one coin
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealSet {
    pub guid: CoinId,
    pub side: Side,
    pub secrets: Vec<Secret>,
}

/// What a merchant keeps from a payment until it deposits at the bank
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Canonical encoding of the coin
    pub coin: String,
    pub signature: Signature,
    pub reveal: RevealSet,
}

/// A merchant accepting coins issued by one bank
#[derive(Clone, Debug)]
pub struct Merchant {
    name: String,
    bank_key: BankPublicKey,
}

impl Merchant {
    pub fn new(name: impl Into<String>, bank_key: BankPublicKey) -> Self {
        Self {
            name: name.into(),
            bank_key,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Verify `coin` and challenge the spender with a fresh random side
    pub fn accept(&self, coin: &Coin) -> Result<RevealSet> {
        self.accept_with_rng(coin, &mut rand::thread_rng())
    }

    pub fn accept_with_rng<R: RngCore + CryptoRng>(
        &self,
        coin: &Coin,
        rng: &mut R,
    ) -> Result<RevealSet> {
        let side = Side::random(rng);
        self.accept_with_side(coin, side)
    }

    /// Verify `coin` and collect the secrets for `side` from every trial
    pub fn accept_with_side(&self, coin: &Coin, side: Side) -> Result<RevealSet> {
        if !coin.verify(&self.bank_key) {
            tracing::warn!("{} rejected coin {}: bad signature", self.name, coin.guid());
            return Err(PiggybankError::SignatureInvalid(coin.guid().to_string()));
        }

        let secrets = (0..coin.trials())
            .map(|i| coin.reveal(side, i))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "{} accepted coin {} ({} {} secrets)",
            self.name,
            coin.guid(),
            secrets.len(),
            side
        );

        Ok(RevealSet {
            guid: coin.guid().clone(),
            side,
            secrets,
        })
    }

    /// Accept `coin` and keep what the bank needs for the deposit
    pub fn take_payment(&self, coin: &Coin) -> Result<Receipt> {
        let reveal = self.accept(coin)?;
        Receipt::new(coin, reveal)
    }
}

impl Receipt {
    pub fn new(coin: &Coin, reveal: RevealSet) -> Result<Self> {
        let signature = coin
            .signature()
            .cloned()
            .ok_or_else(|| PiggybankError::CoinNotIssued(coin.guid().to_string()))?;

        Ok(Self {
            coin: coin.canonical_encoding(),
            signature,
            reveal,
        })
    }
}
