//! # Signature Verification and Gas
//!
//! Pure cryptographic checks used by the signature stages.
//!
//! ## Supported Keys
//!
//! | Key | Signature | Verification |
//! |-----|-----------|--------------|
//! | secp256k1 | 64 bytes `r‖s`, low-S only | `k256` over SHA-256 of the sign bytes |
//! | ed25519 | 64 bytes | `ed25519-dalek` strict verification |
//! | multisig | bincode list of sub-signatures | `threshold` valid sub-signatures |
//!
//! ## Security Notes
//!
//! - **Malleability Prevention**: secp256k1 signatures with high S are rejected.
//! - **Independent Signers**: each signer is verified on its own; one failure
//!   fails the transaction.

use crate::domain::errors::AdmissionError;
use crate::domain::gas::GasMeter;
use crate::domain::params::AuthParams;
use shared_types::{ModeInfo, PublicKey, SignMode};
use std::sync::Arc;
use thiserror::Error;

/// Placeholder key charged and resolved for unsigned signers in simulation.
pub const SIMULATION_PUBKEY: PublicKey = PublicKey::Secp256k1([
    0x03, 0x5a, 0xd6, 0x81, 0x0a, 0x47, 0xf0, 0x73, 0xd8, 0x65, 0x8d, 0x68, 0x32, 0x72, 0x39,
    0x86, 0x3d, 0x9e, 0xfd, 0x55, 0x00, 0x1f, 0x43, 0x3a, 0x98, 0x9d, 0x2e, 0xa6, 0x6d, 0x6d,
    0x5d, 0x41, 0x58,
]);

/// Length of a secp256k1 or ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Signature-level failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Invalid signature format")]
    InvalidFormat,

    #[error("Malleable signature (high S value)")]
    MalleableSignature,

    #[error("Signature verification failed")]
    VerificationFailed,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Signature data does not match {0} key")]
    KeyMismatch(&'static str),

    #[error("Multisig threshold not met: {valid} of {threshold}")]
    ThresholdNotMet { valid: usize, threshold: u32 },

    #[error("Sign bytes unavailable: {0}")]
    SignBytes(String),
}

/// Decoded signature of one signer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureData {
    Single {
        mode: SignMode,
        signature: Vec<u8>,
    },
    Multi {
        bitarray: Vec<bool>,
        signatures: Vec<SignatureData>,
    },
}

impl SignatureData {
    /// Interpret `raw` according to the signer's mode info.
    pub fn decode(mode_info: &ModeInfo, raw: &[u8]) -> Result<Self, SignatureError> {
        match mode_info {
            ModeInfo::Single { mode } => Ok(Self::Single {
                mode: *mode,
                signature: raw.to_vec(),
            }),
            ModeInfo::Multi {
                bitarray,
                mode_infos,
            } => {
                let parts: Vec<Vec<u8>> =
                    bincode::deserialize(raw).map_err(|_| SignatureError::InvalidFormat)?;
                let set_bits = bitarray.iter().filter(|b| **b).count();
                if parts.len() != mode_infos.len() || parts.len() != set_bits {
                    return Err(SignatureError::InvalidFormat);
                }
                let signatures = mode_infos
                    .iter()
                    .zip(parts.iter())
                    .map(|(info, part)| Self::decode(info, part))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Multi {
                    bitarray: bitarray.clone(),
                    signatures,
                })
            }
        }
    }

    /// Encode sub-signatures the way `decode` expects them.
    pub fn encode_multi(parts: &[Vec<u8>]) -> Result<Vec<u8>, SignatureError> {
        bincode::serialize(parts).map_err(|_| SignatureError::InvalidFormat)
    }
}

/// Verify `data` under `pub_key`, asking `sign_bytes` for the payload of each
/// sign mode encountered.
pub fn verify_signature(
    pub_key: &PublicKey,
    data: &SignatureData,
    sign_bytes: &mut dyn FnMut(SignMode) -> Result<Vec<u8>, SignatureError>,
) -> Result<(), SignatureError> {
    match (pub_key, data) {
        (PublicKey::Secp256k1(key), SignatureData::Single { mode, signature }) => {
            let message = sign_bytes(*mode)?;
            verify_secp256k1(key, &message, signature)
        }
        (PublicKey::Ed25519(key), SignatureData::Single { mode, signature }) => {
            let message = sign_bytes(*mode)?;
            verify_ed25519(key, &message, signature)
        }
        (
            PublicKey::Multisig { threshold, keys },
            SignatureData::Multi {
                bitarray,
                signatures,
            },
        ) => {
            if bitarray.len() != keys.len() {
                return Err(SignatureError::InvalidFormat);
            }
            let signed_keys = keys
                .iter()
                .zip(bitarray.iter())
                .filter(|(_, signed)| **signed)
                .map(|(key, _)| key);

            let mut valid = 0usize;
            for (key, sub) in signed_keys.zip(signatures.iter()) {
                verify_signature(key, sub, sign_bytes)?;
                valid += 1;
            }
            if valid < *threshold as usize {
                return Err(SignatureError::ThresholdNotMet {
                    valid,
                    threshold: *threshold,
                });
            }
            Ok(())
        }
        (key, _) => Err(SignatureError::KeyMismatch(key.type_name())),
    }
}

/// Verify a 64-byte `r‖s` secp256k1 signature over SHA-256 of `message`.
pub fn verify_secp256k1(
    key: &[u8; 33],
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    use k256::ecdsa::{signature::Verifier, Signature, VerifyingKey};

    if signature.len() != SIGNATURE_LEN {
        return Err(SignatureError::InvalidFormat);
    }
    let sig = Signature::from_slice(signature).map_err(|_| SignatureError::InvalidFormat)?;
    if sig.normalize_s().is_some() {
        return Err(SignatureError::MalleableSignature);
    }
    let verifying_key =
        VerifyingKey::from_sec1_bytes(key).map_err(|_| SignatureError::InvalidPublicKey)?;
    verifying_key
        .verify(message, &sig)
        .map_err(|_| SignatureError::VerificationFailed)
}

/// Verify an ed25519 signature with strict (non-malleable) rules.
pub fn verify_ed25519(
    key: &[u8; 32],
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    use ed25519_dalek::{Signature, VerifyingKey};

    let verifying_key =
        VerifyingKey::from_bytes(key).map_err(|_| SignatureError::InvalidPublicKey)?;
    let sig = Signature::from_slice(signature).map_err(|_| SignatureError::InvalidFormat)?;
    verifying_key
        .verify_strict(message, &sig)
        .map_err(|_| SignatureError::VerificationFailed)
}

// =============================================================================
// SIGNATURE GAS
// =============================================================================

/// Charges gas for verifying one signer's signature.
pub type SignatureGasConsumer = Arc<
    dyn Fn(&mut GasMeter, &SignatureData, &PublicKey, &AuthParams) -> Result<(), AdmissionError>
        + Send
        + Sync,
>;

/// Default costs: ed25519 and secp256k1 from params, multisig per signed key.
///
/// A multisig key paired with non-multisig data (an unsigned simulation) is
/// charged for every leaf key.
pub fn default_sig_verification_gas_consumer(
    meter: &mut GasMeter,
    data: &SignatureData,
    pub_key: &PublicKey,
    params: &AuthParams,
) -> Result<(), AdmissionError> {
    match pub_key {
        PublicKey::Ed25519(_) => {
            meter.consume(params.sig_verify_cost_ed25519, "ante verify: ed25519")?;
            Ok(())
        }
        PublicKey::Secp256k1(_) => {
            meter.consume(params.sig_verify_cost_secp256k1, "ante verify: secp256k1")?;
            Ok(())
        }
        PublicKey::Multisig { keys, .. } => match data {
            SignatureData::Multi {
                bitarray,
                signatures,
            } => {
                let signed_keys = keys
                    .iter()
                    .zip(bitarray.iter())
                    .filter(|(_, signed)| **signed)
                    .map(|(key, _)| key);
                for (key, sub) in signed_keys.zip(signatures.iter()) {
                    default_sig_verification_gas_consumer(meter, sub, key, params)?;
                }
                Ok(())
            }
            SignatureData::Single { .. } => {
                for key in keys {
                    default_sig_verification_gas_consumer(meter, data, key, params)?;
                }
                Ok(())
            }
        },
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_helpers {
    //! Key generation and signing for tests.

    use super::*;
    use ed25519_dalek::Signer as _;

    /// A secp256k1 signer with its compressed public key.
    pub struct Secp256k1Signer {
        pub signing_key: k256::ecdsa::SigningKey,
        pub public_key: PublicKey,
    }

    impl Secp256k1Signer {
        pub fn generate() -> Self {
            let signing_key = k256::ecdsa::SigningKey::random(&mut rand::thread_rng());
            let encoded = signing_key.verifying_key().to_sec1_bytes();
            let mut bytes = [0u8; 33];
            bytes.copy_from_slice(&encoded[..33]);
            Self {
                signing_key,
                public_key: PublicKey::Secp256k1(bytes),
            }
        }

        /// Low-S `r‖s` signature over `message`.
        pub fn sign(&self, message: &[u8]) -> Vec<u8> {
            let sig: k256::ecdsa::Signature = self.signing_key.sign(message);
            let sig = sig.normalize_s().unwrap_or(sig);
            sig.to_bytes().to_vec()
        }
    }

    /// An ed25519 signer with its public key.
    pub struct Ed25519Signer {
        pub signing_key: ed25519_dalek::SigningKey,
        pub public_key: PublicKey,
    }

    impl Ed25519Signer {
        pub fn from_seed(seed: [u8; 32]) -> Self {
            let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
            let public_key = PublicKey::Ed25519(signing_key.verifying_key().to_bytes());
            Self {
                signing_key,
                public_key,
            }
        }

        pub fn generate() -> Self {
            Self::from_seed(rand::random())
        }

        pub fn sign(&self, message: &[u8]) -> Vec<u8> {
            self.signing_key.sign(message).to_bytes().to_vec()
        }
    }
}
