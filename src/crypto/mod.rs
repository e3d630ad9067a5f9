//! Cryptographic building blocks: blind signatures and identity commitments

pub mod blind;
pub mod identity;
pub mod types;

pub use blind::{blind, message_representative, unblind, verify, BankKey};
pub use identity::{IdentityCommitments, IdentitySecrets, IDENT_PREFIX};
pub use types::{BankPublicKey, BlindSignature, BlindedMessage, BlindingFactor, Signature};

/// One 1024-bit key shared by every unit test in the crate
#[cfg(test)]
pub(crate) fn test_key() -> &'static BankKey {
    use std::sync::OnceLock;

    static KEY: OnceLock<BankKey> = OnceLock::new();
    KEY.get_or_init(|| BankKey::generate(1024, &mut rand::thread_rng()).unwrap())
}
