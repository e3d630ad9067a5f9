//! Piggybank demo application wiring bank, spender and merchants together

use crate::bank::{Bank, DepositOutcome};
use crate::coin::Coin;
use crate::config::ProtocolConfig;
use crate::error::{PiggybankError, Result};
use crate::merchant::Merchant;
use crate::types::{CoinId, Identity, Side};
use serde::Serialize;

/// Summary of one demo run
#[derive(Clone, Debug, Serialize)]
pub struct DemoReport {
    pub guid: CoinId,
    pub coin: String,
    pub first_side: Side,
    pub second_side: Side,
    /// Bank's verdict on the second deposit
    pub second_deposit: DepositOutcome,
    /// Bank's verdict when the first merchant deposits its receipt again
    pub replay_deposit: DepositOutcome,
}

/// One bank and two merchants
pub struct PiggybankApp {
    bank: Bank,
    shop: Merchant,
    cafe: Merchant,
}

impl PiggybankApp {
    /// Create the application; generates a bank key of `config.key_bits`
    pub fn new(config: ProtocolConfig) -> Result<Self> {
        let bank = Bank::new(config, &mut rand::thread_rng())?;
        Ok(Self::with_bank(bank))
    }

    pub fn with_bank(bank: Bank) -> Self {
        let shop = Merchant::new("shop", bank.public_key());
        let cafe = Merchant::new("cafe", bank.public_key());
        Self { bank, shop, cafe }
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    /// Mint a coin and have the bank sign it blind
    pub fn mint(&self, identity: &str, amount: u64) -> Result<Coin> {
        let mut coin = Coin::construct(
            Identity::new(identity),
            amount,
            &self.bank.public_key(),
            self.bank.config(),
            &mut rand::thread_rng(),
        )?;

        let blinded = coin
            .blinded_message()
            .cloned()
            .ok_or_else(|| PiggybankError::CoinNotIssued(coin.guid().to_string()))?;
        let blind_signature = self.bank.sign(&blinded)?;
        coin.finalize_signature(&blind_signature)?;

        Ok(coin)
    }

    /// Spend one coin at both merchants, deposit both receipts, then have
    /// the first merchant deposit its receipt a second time.
    pub fn run_demo(&self, identity: &str, amount: u64) -> Result<DemoReport> {
        let coin = self.mint(identity, amount)?;

        let first = self.shop.take_payment(&coin)?;
        let second = self.cafe.take_payment(&coin)?;
        tracing::info!(
            "Coin {} spent at {} ({}) and {} ({})",
            coin.guid(),
            self.shop.name(),
            first.reveal.side,
            self.cafe.name(),
            second.reveal.side
        );

        let first_deposit = self.bank.deposit(self.shop.name(), &first)?;
        tracing::debug!("First deposit: {:?}", first_deposit);
        let second_deposit = self.bank.deposit(self.cafe.name(), &second)?;

        let replay_deposit = self.bank.deposit(self.shop.name(), &first)?;

        Ok(DemoReport {
            guid: coin.guid().clone(),
            coin: coin.canonical_encoding(),
            first_side: first.reveal.side,
            second_side: second.reveal.side,
            second_deposit,
            replay_deposit,
        })
    }
}
