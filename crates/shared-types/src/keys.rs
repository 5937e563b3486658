//! # Public Keys
//!
//! Signer public keys carried by transactions or stored on accounts.
//!
//! Address derivation: first 20 bytes of SHA-256 over the key's canonical
//! bytes. For threshold keys the canonical bytes are the threshold followed by
//! every sub-key, each prefixed with its type tag.

use crate::entities::Address;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};

/// Length of a compressed secp256k1 public key.
pub const SECP256K1_PUBKEY_LEN: usize = 33;

/// Length of an ed25519 public key.
pub const ED25519_PUBKEY_LEN: usize = 32;

/// A signer public key.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicKey {
    /// Compressed secp256k1 key (0x02/0x03 || x).
    Secp256k1(#[serde_as(as = "Bytes")] [u8; SECP256K1_PUBKEY_LEN]),
    /// Ed25519 key.
    Ed25519([u8; ED25519_PUBKEY_LEN]),
    /// Threshold multisig: `threshold` of `keys` must sign.
    Multisig { threshold: u32, keys: Vec<PublicKey> },
}

impl PublicKey {
    /// Derive the account address for this key.
    pub fn address(&self) -> Address {
        let mut hasher = Sha256::new();
        self.write_canonical(&mut hasher);
        let digest = hasher.finalize();
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[..20]);
        address
    }

    /// Number of leaf keys (1 for single keys, recursive for multisig).
    pub fn sub_key_count(&self) -> usize {
        match self {
            Self::Multisig { keys, .. } => keys.iter().map(PublicKey::sub_key_count).sum(),
            _ => 1,
        }
    }

    /// Short type name used in logs and gas descriptors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Secp256k1(_) => "secp256k1",
            Self::Ed25519(_) => "ed25519",
            Self::Multisig { .. } => "multisig",
        }
    }

    /// Size of the key material in bytes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Secp256k1(_) => SECP256K1_PUBKEY_LEN,
            Self::Ed25519(_) => ED25519_PUBKEY_LEN,
            Self::Multisig { keys, .. } => 4 + keys.iter().map(|k| 1 + k.encoded_len()).sum::<usize>(),
        }
    }

    fn write_canonical(&self, hasher: &mut Sha256) {
        match self {
            Self::Secp256k1(bytes) => hasher.update(bytes),
            Self::Ed25519(bytes) => hasher.update(bytes),
            Self::Multisig { threshold, keys } => {
                hasher.update(b"multisig");
                hasher.update(threshold.to_be_bytes());
                for key in keys {
                    hasher.update([key.tag()]);
                    key.write_canonical(hasher);
                }
            }
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Self::Secp256k1(_) => 0x01,
            Self::Ed25519(_) => 0x02,
            Self::Multisig { .. } => 0x03,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_deterministic() {
        let key = PublicKey::Secp256k1([0x02; 33]);
        assert_eq!(key.address(), key.address());
        assert_ne!(key.address(), PublicKey::Secp256k1([0x03; 33]).address());
    }

    #[test]
    fn test_multisig_address_depends_on_threshold() {
        let keys = vec![PublicKey::Ed25519([1; 32]), PublicKey::Ed25519([2; 32])];
        let one = PublicKey::Multisig {
            threshold: 1,
            keys: keys.clone(),
        };
        let two = PublicKey::Multisig { threshold: 2, keys };
        assert_ne!(one.address(), two.address());
    }

    #[test]
    fn test_sub_key_count_is_recursive() {
        let inner = PublicKey::Multisig {
            threshold: 1,
            keys: vec![PublicKey::Ed25519([1; 32]), PublicKey::Ed25519([2; 32])],
        };
        let outer = PublicKey::Multisig {
            threshold: 2,
            keys: vec![inner, PublicKey::Secp256k1([0x02; 33])],
        };
        assert_eq!(outer.sub_key_count(), 3);
        assert_eq!(PublicKey::Ed25519([0; 32]).sub_key_count(), 1);
    }
}
