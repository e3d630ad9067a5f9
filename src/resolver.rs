//! Double-spend resolution
//!
//! Two deposits of one coin carry two reveal sets. If the spender opened
//! different sides for the two merchants, XOR-ing the secrets trial by trial
//! gives back `IDENT_PREFIX || identity`. If both reveal sets opened the same
//! side, nothing can be recovered and the duplicate came from a merchant.

use serde::{Deserialize, Serialize};

use crate::crypto::identity::decode_identity;
use crate::error::{PiggybankError, Result};
use crate::merchant::RevealSet;
use crate::types::{CoinId, Identity};

/// Outcome of comparing two deposits of the same coin
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// The spender double-spent the coin
    Identified(Identity),
    /// The same acceptance was deposited twice
    MerchantFraud,
}

/// Decide who is behind two deposits of coin `guid`.
///
/// Every trial that recovers an identity must recover the same one, and a
/// pair that identifies on some trials must identify on all of them.
pub fn resolve(guid: &CoinId, first: &RevealSet, second: &RevealSet) -> Result<Resolution> {
    check_contract(guid, first, second)?;

    let mut identified: Option<Identity> = None;
    let mut unmatched: Option<usize> = None;

    for (trial, (a, b)) in first.secrets.iter().zip(&second.secrets).enumerate() {
        let plaintext = a.xor(b).ok_or_else(|| {
            PiggybankError::ResolverContractViolation(format!(
                "trial {} secrets differ in length ({} vs {})",
                trial,
                a.len(),
                b.len()
            ))
        })?;

        match decode_identity(&plaintext) {
            None => {
                unmatched.get_or_insert(trial);
            }
            Some(Err(e)) => {
                return Err(PiggybankError::TrialDisagreement {
                    trial,
                    detail: format!("recovered identity is not UTF-8: {}", e),
                });
            }
            Some(Ok(identity)) => {
                if let Some(previous) = &identified {
                    if *previous != identity {
                        return Err(PiggybankError::TrialDisagreement {
                            trial,
                            detail: format!("recovered {} after {}", identity, previous),
                        });
                    }
                }
                if identified.is_none() {
                    identified = Some(identity);
                }
            }
        }
    }

    match (identified, unmatched) {
        (Some(identity), None) => {
            tracing::warn!("Coin {} double-spent by {}", guid, identity);
            Ok(Resolution::Identified(identity))
        }
        (Some(identity), Some(trial)) => Err(PiggybankError::TrialDisagreement {
            trial,
            detail: format!("no identity while other trials recover {}", identity),
        }),
        (None, _) => {
            tracing::warn!("Coin {} deposited twice without a double spend", guid);
            Ok(Resolution::MerchantFraud)
        }
    }
}

fn check_contract(guid: &CoinId, first: &RevealSet, second: &RevealSet) -> Result<()> {
    for reveal in [first, second] {
        if reveal.guid != *guid {
            return Err(PiggybankError::ResolverContractViolation(format!(
                "reveal set for coin {} passed while resolving {}",
                reveal.guid, guid
            )));
        }
    }
    if first.secrets.is_empty() || second.secrets.is_empty() {
        return Err(PiggybankError::ResolverContractViolation(
            "empty reveal set".to_string(),
        ));
    }
    if first.secrets.len() != second.secrets.len() {
        return Err(PiggybankError::ResolverContractViolation(format!(
            "reveal sets have {} and {} trials",
            first.secrets.len(),
            second.secrets.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::identity::{build, encode_identity};
    use crate::crypto::{IdentitySecrets, IDENT_PREFIX};
    use crate::types::{Secret, Side};

    fn guid() -> CoinId {
        CoinId("00112233445566778899aabbccddeeff".to_string())
    }

    fn reveal(secrets: &IdentitySecrets, side: Side) -> RevealSet {
        RevealSet {
            guid: guid(),
            side,
            secrets: (0..secrets.trials())
                .map(|i| secrets.reveal(side, i).unwrap().clone())
                .collect(),
        }
    }

    fn secrets_for(name: &str) -> IdentitySecrets {
        build(&Identity::new(name), 3, 64, &mut rand::thread_rng())
            .unwrap()
            .0
    }

    #[test]
    fn test_different_sides_identify_spender() {
        let secrets = secrets_for("alice");
        let left = reveal(&secrets, Side::Left);
        let right = reveal(&secrets, Side::Right);

        assert_eq!(
            resolve(&guid(), &left, &right).unwrap(),
            Resolution::Identified(Identity::new("alice"))
        );
        assert_eq!(
            resolve(&guid(), &right, &left).unwrap(),
            Resolution::Identified(Identity::new("alice"))
        );
    }

    #[test]
    fn test_same_side_is_merchant_fraud() {
        let secrets = secrets_for("alice");
        for side in [Side::Left, Side::Right] {
            let a = reveal(&secrets, side);
            let b = reveal(&secrets, side);
            assert_eq!(resolve(&guid(), &a, &b).unwrap(), Resolution::MerchantFraud);
        }
    }

    #[test]
    fn test_guid_mismatch_is_contract_violation() {
        let secrets = secrets_for("alice");
        let left = reveal(&secrets, Side::Left);
        let mut right = reveal(&secrets, Side::Right);
        right.guid = CoinId("ffeeddccbbaa99887766554433221100".to_string());

        assert!(matches!(
            resolve(&guid(), &left, &right),
            Err(PiggybankError::ResolverContractViolation(_))
        ));
    }

    #[test]
    fn test_length_mismatch_is_contract_violation() {
        let secrets = secrets_for("alice");
        let left = reveal(&secrets, Side::Left);
        let mut right = reveal(&secrets, Side::Right);
        right.secrets.pop();

        assert!(matches!(
            resolve(&guid(), &left, &right),
            Err(PiggybankError::ResolverContractViolation(_))
        ));

        let empty = RevealSet {
            guid: guid(),
            side: Side::Left,
            secrets: vec![],
        };
        assert!(matches!(
            resolve(&guid(), &empty, &empty),
            Err(PiggybankError::ResolverContractViolation(_))
        ));

        let mut short_secret = reveal(&secrets, Side::Right);
        short_secret.secrets[1] = Secret(vec![0u8; 8]);
        assert!(matches!(
            resolve(&guid(), &left, &short_secret),
            Err(PiggybankError::ResolverContractViolation(_))
        ));
    }

    #[test]
    fn test_trials_naming_different_identities() {
        let alice = secrets_for("alice");
        let mallory = secrets_for("mallory");

        let left = reveal(&alice, Side::Left);
        let mut right = reveal(&alice, Side::Right);
        // trial 2 comes from a coin split for someone else
        let plaintext = encode_identity(&Identity::new("mallory"), 64).unwrap();
        let forged: Vec<u8> = left.secrets[2]
            .0
            .iter()
            .zip(&plaintext)
            .map(|(a, b)| a ^ b)
            .collect();
        right.secrets[2] = Secret(forged);

        assert!(matches!(
            resolve(&guid(), &left, &right),
            Err(PiggybankError::TrialDisagreement { trial: 2, .. })
        ));

        let mut partial = reveal(&alice, Side::Right);
        partial.secrets[0] = mallory.reveal(Side::Right, 0).unwrap().clone();
        assert!(matches!(
            resolve(&guid(), &left, &partial),
            Err(PiggybankError::TrialDisagreement { trial: 0, .. })
        ));
    }

    #[test]
    fn test_non_utf8_identity_is_disagreement() {
        let mut plaintext = IDENT_PREFIX.to_vec();
        plaintext.extend_from_slice(&[0xff, 0xfe, 0xfd]);
        plaintext.resize(64, 0);

        let left: Vec<Secret> = (0..3u8).map(|i| Secret(vec![i; 64])).collect();
        let right: Vec<Secret> = left
            .iter()
            .map(|s| Secret(s.0.iter().zip(&plaintext).map(|(a, b)| a ^ b).collect()))
            .collect();

        let first = RevealSet {
            guid: guid(),
            side: Side::Left,
            secrets: left,
        };
        let second = RevealSet {
            guid: guid(),
            side: Side::Right,
            secrets: right,
        };

        assert!(matches!(
            resolve(&guid(), &first, &second),
            Err(PiggybankError::TrialDisagreement { trial: 0, .. })
        ));
    }

    #[test]
    fn test_resolution_serialization() {
        let resolution = Resolution::Identified(Identity::new("alice"));
        let serialized = serde_json::to_string(&resolution).unwrap();
        let deserialized: Resolution = serde_json::from_str(&serialized).unwrap();
        assert_eq!(resolution, deserialized);
    }
}
