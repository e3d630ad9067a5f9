//! Protocol parameters shared by the bank, spenders and merchants

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::crypto::identity::IDENT_PREFIX;
use crate::error::{PiggybankError, Result};

/// Marker the bank puts in front of every coin it issues
pub const DEFAULT_BANK_MARKER: &str = "ELECTRONIC_PIGGYBANK";

/// Number of identity splittings embedded in each coin
pub const DEFAULT_TRIALS: usize = 3;

/// Length in bytes of every secret half
pub const DEFAULT_SECRET_LEN: usize = 64;

pub const DEFAULT_KEY_BITS: usize = 2048;

pub const MIN_KEY_BITS: usize = 512;

/// Minimum random bytes per secret half
pub const MIN_SECRET_LEN: usize = 16;

/// Protocol configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub bank_marker: String,
    pub trials: usize,
    pub secret_len: usize,
    pub key_bits: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            bank_marker: DEFAULT_BANK_MARKER.to_string(),
            trials: DEFAULT_TRIALS,
            secret_len: DEFAULT_SECRET_LEN,
            key_bits: DEFAULT_KEY_BITS,
        }
    }
}

impl ProtocolConfig {
    /// Load configuration from a JSON file; absent fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: ProtocolConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter is usable
    pub fn validate(&self) -> Result<()> {
        if self.bank_marker.is_empty() {
            return Err(PiggybankError::InvalidConfig(
                "bank_marker must not be empty".to_string(),
            ));
        }
        if self.bank_marker.contains(|c| c == '-' || c == ',') {
            return Err(PiggybankError::InvalidConfig(format!(
                "bank_marker {:?} contains a coin delimiter",
                self.bank_marker
            )));
        }
        if self.trials == 0 {
            return Err(PiggybankError::InvalidConfig(
                "trials must be at least 1".to_string(),
            ));
        }
        if self.secret_len < MIN_SECRET_LEN || self.secret_len <= IDENT_PREFIX.len() {
            return Err(PiggybankError::InvalidConfig(format!(
                "secret_len {} too small (minimum {})",
                self.secret_len,
                MIN_SECRET_LEN.max(IDENT_PREFIX.len() + 1)
            )));
        }
        if self.key_bits < MIN_KEY_BITS {
            return Err(PiggybankError::InvalidConfig(format!(
                "key_bits {} below minimum {}",
                self.key_bits, MIN_KEY_BITS
            )));
        }
        Ok(())
    }

    /// Longest identity, in bytes, that fits in a secret
    pub fn max_identity_len(&self) -> usize {
        self.secret_len.saturating_sub(IDENT_PREFIX.len())
    }
}
