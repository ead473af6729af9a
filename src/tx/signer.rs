//! Transaction signing.
//!
//! Signers receive the exact transaction bytes produced by the build phase and
//! return a serialized user signature. [`Ed25519Signer`] implements the Sui
//! scheme: the message is `Blake2b-256(intent || tx_bytes)` with the
//! transaction-data intent `[0, 0, 0]`, and the signature is serialized as
//! `0x00 || signature (64) || public key (32)`.
//!
//! Keys are accepted in both export formats: bech32 `suiprivkey1…` and the
//! base64 keystore entry. Both carry `flag || 32-byte secret`.

use super::{TransactionPayload, UserSignature};
use crate::error::{BenchError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use blake2::{digest::consts::U32, Blake2b, Digest};
use ed25519_dalek::{Signer, SigningKey};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// Signature scheme flag for Ed25519
pub const ED25519_FLAG: u8 = 0x00;

/// Human-readable part of bech32 private keys
pub const SUI_PRIVKEY_HRP: &str = "suiprivkey";

/// Intent prefix for transaction data: scope, version, app id
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// Signs transaction bytes
pub trait TransactionSigner: Send + Sync {
    /// Address the transactions are sent from
    fn address(&self) -> String;

    fn sign_transaction(&self, payload: &TransactionPayload) -> Result<UserSignature>;
}

/// Ed25519 key pair
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_bytes(secret: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&secret),
        }
    }

    /// Parse a private key: bech32 `suiprivkey1…` or a base64 keystore entry.
    pub fn from_keystore(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        let bytes = if encoded.starts_with(SUI_PRIVKEY_HRP) {
            let (hrp, data) = bech32::decode(encoded)
                .map_err(|e| BenchError::InvalidKey(format!("not bech32: {e}")))?;
            if hrp.to_string() != SUI_PRIVKEY_HRP {
                return Err(BenchError::InvalidKey(format!(
                    "unexpected bech32 prefix {hrp}"
                )));
            }
            data
        } else {
            BASE64
                .decode(encoded)
                .map_err(|e| BenchError::InvalidKey(format!("not base64: {e}")))?
        };

        Self::from_flagged(&bytes)
    }

    fn from_flagged(bytes: &[u8]) -> Result<Self> {
        match bytes.split_first() {
            Some((&ED25519_FLAG, secret)) if secret.len() == 32 => {
                let mut buf = [0u8; 32];
                buf.copy_from_slice(secret);
                Ok(Self::from_bytes(buf))
            }
            Some((&ED25519_FLAG, secret)) => Err(BenchError::InvalidKey(format!(
                "expected 32 secret bytes, got {}",
                secret.len()
            ))),
            Some((flag, _)) => Err(BenchError::InvalidKey(format!(
                "unsupported signature scheme flag {flag:#04x}"
            ))),
            None => Err(BenchError::InvalidKey("empty key".to_string())),
        }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

impl TransactionSigner for Ed25519Signer {
    fn address(&self) -> String {
        let mut hasher = Blake2b256::new();
        hasher.update([ED25519_FLAG]);
        hasher.update(self.public_key());
        format!("0x{}", hex::encode(hasher.finalize()))
    }

    fn sign_transaction(&self, payload: &TransactionPayload) -> Result<UserSignature> {
        let mut hasher = Blake2b256::new();
        hasher.update(TRANSACTION_INTENT);
        hasher.update(payload.as_bytes());
        let digest = hasher.finalize();

        let signature = self.key.sign(&digest);

        let mut bytes = Vec::with_capacity(1 + 64 + 32);
        bytes.push(ED25519_FLAG);
        bytes.extend_from_slice(&signature.to_bytes());
        bytes.extend_from_slice(&self.public_key());
        Ok(UserSignature::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    fn keystore_entry(secret: [u8; 32]) -> String {
        let mut raw = vec![ED25519_FLAG];
        raw.extend_from_slice(&secret);
        BASE64.encode(raw)
    }

    #[test]
    fn test_keystore_round_trip() {
        let signer = Ed25519Signer::from_keystore(&keystore_entry([7u8; 32])).unwrap();
        assert_eq!(signer.public_key(), Ed25519Signer::from_bytes([7u8; 32]).public_key());
    }

    /// Bech32 export of the secret 0x01..=0x20
    const BECH32_KEY: &str = "suiprivkey1qqqsyqcyq5rqwzqfpg9scrgwpugpzysnzs23v9ccrydpk8qarc0jqa4ffsr";
    const BECH32_KEY_ADDRESS: &str =
        "0x7573c697fa68450f04fa0dee2d39dcdc8a5ccf5db547f3e47638a6f8eeeec110";

    fn counting_secret() -> [u8; 32] {
        let mut secret = [0u8; 32];
        for (i, b) in secret.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        secret
    }

    #[test]
    fn test_bech32_key_matches_known_address() {
        let signer = Ed25519Signer::from_keystore(BECH32_KEY).unwrap();
        assert_eq!(signer.address(), BECH32_KEY_ADDRESS);
        assert_eq!(
            hex::encode(signer.public_key()),
            "79b5562e8fe654f94078b112e8a98ba7901f853ae695bed7e0e3910bad049664"
        );

        let keystore = Ed25519Signer::from_keystore(&keystore_entry(counting_secret())).unwrap();
        assert_eq!(keystore.address(), BECH32_KEY_ADDRESS);
    }

    #[test]
    fn test_bech32_key_with_bad_checksum_is_rejected() {
        let mut corrupted = BECH32_KEY.to_string();
        corrupted.pop();
        corrupted.push('q');
        assert!(matches!(
            Ed25519Signer::from_keystore(&corrupted),
            Err(BenchError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_shows_only_public_key() {
        let signer = Ed25519Signer::from_bytes(counting_secret());
        let rendered = format!("{signer:?}");
        assert!(rendered.contains("79b5562e8fe654f9"));
        assert!(!rendered.contains("0102030405"));
    }

    #[test]
    fn test_keystore_rejects_bad_input() {
        assert!(Ed25519Signer::from_keystore("suiprivkey1qq").is_err());
        assert!(Ed25519Signer::from_keystore("%%%").is_err());

        let mut secp = vec![0x01u8];
        secp.extend_from_slice(&[1u8; 32]);
        let err = Ed25519Signer::from_keystore(&BASE64.encode(secp)).unwrap_err();
        assert!(err.to_string().contains("0x01"));

        let short = BASE64.encode([ED25519_FLAG, 1, 2, 3]);
        assert!(Ed25519Signer::from_keystore(&short).is_err());
    }

    #[test]
    fn test_address_format() {
        let address = Ed25519Signer::from_bytes([1u8; 32]).address();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 66);
    }

    #[test]
    fn test_signature_layout_and_validity() {
        let signer = Ed25519Signer::from_bytes([3u8; 32]);
        let payload = TransactionPayload::new(vec![0xde, 0xad, 0xbe, 0xef]);

        let sig = signer.sign_transaction(&payload).unwrap();
        let bytes = sig.as_bytes();
        assert_eq!(bytes.len(), 97);
        assert_eq!(bytes[0], ED25519_FLAG);
        assert_eq!(&bytes[65..], &signer.public_key());

        let mut hasher = Blake2b256::new();
        hasher.update(TRANSACTION_INTENT);
        hasher.update(payload.as_bytes());
        let digest = hasher.finalize();

        let signature = Signature::from_slice(&bytes[1..65]).unwrap();
        signer
            .key
            .verifying_key()
            .verify(&digest, &signature)
            .unwrap();
    }
}
