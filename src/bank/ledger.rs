//! Deposit ledger: every deposit ever made, keyed by coin

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use crate::error::Result;
use crate::merchant::RevealSet;
use crate::resolver::{resolve, Resolution};
use crate::types::{CoinId, Identity};

/// One deposit of a coin
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DepositRecord {
    pub merchant: String,
    pub reveal: RevealSet,
    pub deposited_at: SystemTime,
}

/// What the bank concluded from a deposit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositOutcome {
    /// First deposit of this coin
    Accepted,
    /// The coin was spent twice; its owner is known
    DoubleSpent { guid: CoinId, spender: Identity },
    /// The depositing merchant replayed an earlier acceptance
    MerchantFraud { guid: CoinId, merchant: String },
}

/// Append-only deposit history
#[derive(Debug, Default)]
pub struct DepositLedger {
    deposits: Mutex<HashMap<CoinId, Vec<DepositRecord>>>,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deposit and resolve it against every earlier deposit of the
    /// same coin. Resolution and insertion happen under one lock, so
    /// concurrent deposits of a coin are each paired exactly once.
    ///
    /// A deposit repeating an earlier acceptance verbatim is charged to the
    /// depositing merchant even when the coin was also double-spent.
    pub fn record(&self, merchant: &str, reveal: RevealSet) -> Result<DepositOutcome> {
        let mut deposits = self
            .deposits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let guid = reveal.guid.clone();
        let history = deposits.entry(guid.clone()).or_default();

        let replayed = history.iter().any(|earlier| earlier.reveal == reveal);

        let mut outcome = DepositOutcome::Accepted;
        for earlier in history.iter() {
            match resolve(&guid, &earlier.reveal, &reveal)? {
                Resolution::Identified(spender) if !replayed => {
                    outcome = DepositOutcome::DoubleSpent {
                        guid: guid.clone(),
                        spender,
                    };
                    break;
                }
                _ => {
                    outcome = DepositOutcome::MerchantFraud {
                        guid: guid.clone(),
                        merchant: merchant.to_string(),
                    };
                }
            }
        }

        history.push(DepositRecord {
            merchant: merchant.to_string(),
            reveal,
            deposited_at: SystemTime::now(),
        });

        Ok(outcome)
    }

    /// Number of deposits seen for `guid`
    pub fn deposit_count(&self, guid: &CoinId) -> usize {
        self.deposits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(guid)
            .map_or(0, Vec::len)
    }

    /// Copy of the history for `guid`
    pub fn history(&self, guid: &CoinId) -> Vec<DepositRecord> {
        self.deposits
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(guid)
            .cloned()
            .unwrap_or_default()
    }
}
