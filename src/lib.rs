//! Piggybank
//!
//! Offline anonymous e-cash in the Chaum style. The bank signs coins blind,
//! so it cannot link a coin to the spender who withdrew it. Each coin carries
//! hash commitments to XOR shares of its owner's identity; a merchant opens one
//! side of every share, and two openings of different sides expose the owner
//! of a coin that was spent twice.

pub mod bank;
pub mod cli;
pub mod coin;
pub mod config;
pub mod crypto;
pub mod error;
pub mod issuance;
pub mod merchant;
pub mod resolver;
pub mod types;

// Re-export commonly used types and functions
pub use bank::{Bank, DepositLedger, DepositOutcome};
pub use coin::{Coin, CoinHeader};
pub use config::ProtocolConfig;
pub use crypto::{BankKey, BankPublicKey, Signature, IDENT_PREFIX};
pub use error::{PiggybankError, Result};
pub use merchant::{Merchant, Receipt, RevealSet};
pub use resolver::{resolve, Resolution};
pub use types::{CoinId, Hash, Identity, Secret, Side};
