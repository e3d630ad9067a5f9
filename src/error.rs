//! Error types for Piggybank

use thiserror::Error;

/// Main error type for Piggybank
#[derive(Error, Debug)]
pub enum PiggybankError {
    // Coin validity errors
    #[error("Invalid coin signature: {0}")]
    SignatureInvalid(String),

    #[error("Invalid identity string: {received} received, but {expected} expected")]
    MarkerMismatch { received: String, expected: String },

    #[error("Malformed coin: {0}")]
    MalformedCoin(String),

    #[error("Coin not issued yet: {0}")]
    CoinNotIssued(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(u64),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    // Protocol errors
    #[error("Trial index {index} out of range (coin has {trials} trials)")]
    OutOfRangeTrial { index: usize, trials: usize },

    #[error("Signing failed: {0}")]
    SigningFailure(String),

    #[error("Invalid reveal set: {0}")]
    InvalidReveal(String),

    // Resolution errors
    #[error("Resolver contract violation: {0}")]
    ResolverContractViolation(String),

    #[error("Trials disagree at trial {trial}: {detail}")]
    TrialDisagreement { trial: usize, detail: String },

    // Key and configuration errors
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfig(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

/// Result type alias for Piggybank operations
pub type Result<T> = std::result::Result<T, PiggybankError>;
