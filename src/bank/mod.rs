//! The bank: blind issuance and deposit settlement

pub mod ledger;

pub use ledger::{DepositLedger, DepositOutcome, DepositRecord};

use rand::{CryptoRng, RngCore};

use crate::coin::CoinHeader;
use crate::config::ProtocolConfig;
use crate::crypto::{self, BankKey, BankPublicKey, BlindSignature, BlindedMessage};
use crate::error::{PiggybankError, Result};
use crate::issuance;
use crate::merchant::Receipt;

/// A bank instance with its own key and deposit history
#[derive(Debug)]
pub struct Bank {
    config: ProtocolConfig,
    key: BankKey,
    ledger: DepositLedger,
}

impl Bank {
    /// Create a bank with a freshly generated key
    pub fn new<R: RngCore + CryptoRng>(config: ProtocolConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let key = BankKey::generate(config.key_bits, rng)?;
        Self::with_key(config, key)
    }

    /// Create a bank around an existing key
    pub fn with_key(config: ProtocolConfig, key: BankKey) -> Result<Self> {
        config.validate()?;
        let bank = Self {
            config,
            key,
            ledger: DepositLedger::new(),
        };
        tracing::info!(
            "Bank {} ready (key {})",
            bank.config.bank_marker,
            bank.public_key().fingerprint()
        );
        Ok(bank)
    }

    pub fn public_key(&self) -> BankPublicKey {
        self.key.public_key()
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn ledger(&self) -> &DepositLedger {
        &self.ledger
    }

    /// Sign a blinded coin for a spender
    pub fn sign(&self, blinded: &BlindedMessage) -> Result<BlindSignature> {
        let signature = issuance::sign_blinded(blinded, &self.key)?;
        tracing::info!("{} issued a blind signature", self.config.bank_marker);
        Ok(signature)
    }

    /// Settle a merchant's receipt
    pub fn deposit(&self, merchant: &str, receipt: &Receipt) -> Result<DepositOutcome> {
        let header = CoinHeader::parse(&receipt.coin, &self.config.bank_marker)?;

        if !crypto::verify(&receipt.signature, receipt.coin.as_bytes(), &self.public_key()) {
            tracing::warn!("Deposit from {} rejected: bad signature on {}", merchant, header.guid);
            return Err(PiggybankError::SignatureInvalid(header.guid.to_string()));
        }

        check_reveal(&header, receipt)?;

        let outcome = self.ledger.record(merchant, receipt.reveal.clone())?;
        match &outcome {
            DepositOutcome::Accepted => {
                tracing::info!("{} deposited coin {} ({})", merchant, header.guid, header.amount)
            }
            DepositOutcome::DoubleSpent { guid, spender } => {
                tracing::warn!("Double-spender identified on coin {}: {}", guid, spender)
            }
            DepositOutcome::MerchantFraud { guid, merchant } => {
                tracing::warn!("Merchant {} attempted fraud with coin {}", merchant, guid)
            }
        }
        Ok(outcome)
    }
}

/// Every revealed secret must open the commitment on its side
fn check_reveal(header: &CoinHeader, receipt: &Receipt) -> Result<()> {
    let reveal = &receipt.reveal;
    if reveal.guid != header.guid {
        return Err(PiggybankError::InvalidReveal(format!(
            "reveal for {} deposited with coin {}",
            reveal.guid, header.guid
        )));
    }
    if reveal.secrets.len() != header.trials() {
        return Err(PiggybankError::InvalidReveal(format!(
            "{} secrets for a coin with {} trials",
            reveal.secrets.len(),
            header.trials()
        )));
    }
    let committed = header.hashes(reveal.side);
    for (trial, (secret, hash)) in reveal.secrets.iter().zip(committed).enumerate() {
        if secret.hash() != *hash {
            return Err(PiggybankError::InvalidReveal(format!(
                "{} secret of trial {} does not match its commitment",
                reveal.side, trial
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::Coin;
    use crate::crypto::test_key;
    use crate::merchant::{Merchant, RevealSet};
    use crate::types::{Identity, Secret, Side};

    fn test_bank() -> Bank {
        let config = ProtocolConfig {
            key_bits: 1024,
            ..Default::default()
        };
        Bank::with_key(config, test_key().clone()).unwrap()
    }

    fn issued_coin(bank: &Bank, owner: &str) -> Coin {
        let mut coin = Coin::construct(
            Identity::new(owner),
            20,
            &bank.public_key(),
            bank.config(),
            &mut rand::thread_rng(),
        )
        .unwrap();
        let blind_sig = bank.sign(coin.blinded_message().unwrap()).unwrap();
        coin.finalize_signature(&blind_sig).unwrap();
        coin
    }

    fn receipt(bank: &Bank, coin: &Coin, side: Side) -> Receipt {
        let reveal = Merchant::new("shop", bank.public_key())
            .accept_with_side(coin, side)
            .unwrap();
        Receipt::new(coin, reveal).unwrap()
    }

    #[test]
    fn test_deposit_then_double_spend() {
        let bank = test_bank();
        let coin = issued_coin(&bank, "alice");

        let first = bank.deposit("shop", &receipt(&bank, &coin, Side::Left)).unwrap();
        let second = bank.deposit("cafe", &receipt(&bank, &coin, Side::Right)).unwrap();

        assert_eq!(first, DepositOutcome::Accepted);
        assert_eq!(
            second,
            DepositOutcome::DoubleSpent {
                guid: coin.guid().clone(),
                spender: Identity::new("alice"),
            }
        );
    }

    #[test]
    fn test_redeposit_is_merchant_fraud() {
        let bank = test_bank();
        let coin = issued_coin(&bank, "bob");
        let slip = receipt(&bank, &coin, Side::Right);

        bank.deposit("shop", &slip).unwrap();
        let outcome = bank.deposit("shop", &slip).unwrap();

        assert_eq!(
            outcome,
            DepositOutcome::MerchantFraud {
                guid: coin.guid().clone(),
                merchant: "shop".to_string(),
            }
        );
        assert_eq!(bank.ledger().deposit_count(coin.guid()), 2);
    }

    #[test]
    fn test_deposit_rejects_foreign_marker() {
        let bank = test_bank();
        let coin = issued_coin(&bank, "alice");
        let mut slip = receipt(&bank, &coin, Side::Left);
        slip.coin = slip.coin.replacen("ELECTRONIC_PIGGYBANK", "OTHER_BANK", 1);

        assert!(matches!(
            bank.deposit("shop", &slip),
            Err(PiggybankError::MarkerMismatch { .. })
        ));
    }

    #[test]
    fn test_deposit_rejects_forged_amount() {
        let bank = test_bank();
        let coin = issued_coin(&bank, "alice");
        let mut slip = receipt(&bank, &coin, Side::Left);
        slip.coin = slip.coin.replacen("-20-", "-2000-", 1);

        assert!(matches!(
            bank.deposit("shop", &slip),
            Err(PiggybankError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_deposit_rejects_bad_reveal() {
        let bank = test_bank();
        let coin = issued_coin(&bank, "alice");

        let mut wrong_side = receipt(&bank, &coin, Side::Left);
        wrong_side.reveal.side = Side::Right;
        assert!(matches!(
            bank.deposit("shop", &wrong_side),
            Err(PiggybankError::InvalidReveal(_))
        ));

        let mut made_up = receipt(&bank, &coin, Side::Left);
        made_up.reveal.secrets[0] = Secret(vec![0u8; 64]);
        assert!(matches!(
            bank.deposit("shop", &made_up),
            Err(PiggybankError::InvalidReveal(_))
        ));

        let other = issued_coin(&bank, "carol");
        let mut mixed = receipt(&bank, &coin, Side::Left);
        mixed.reveal = RevealSet {
            guid: other.guid().clone(),
            ..mixed.reveal
        };
        assert!(matches!(
            bank.deposit("shop", &mixed),
            Err(PiggybankError::InvalidReveal(_))
        ));

        assert_eq!(bank.ledger().deposit_count(coin.guid()), 0);
    }

    #[test]
    fn test_banks_are_independent() {
        let bank_a = test_bank();
        let bank_b = Bank::new(
            ProtocolConfig {
                key_bits: 1024,
                ..Default::default()
            },
            &mut rand::thread_rng(),
        )
        .unwrap();
        let coin = issued_coin(&bank_a, "alice");

        assert_ne!(bank_a.public_key(), bank_b.public_key());
        assert!(matches!(
            bank_b.deposit("shop", &receipt(&bank_a, &coin, Side::Left)),
            Err(PiggybankError::SignatureInvalid(_))
        ));
    }
}
