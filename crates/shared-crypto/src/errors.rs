//! Crypto error types.

use thiserror::Error;

/// Failures of key parsing, derivation and raw signature checks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// DER signature parsed but does not match the key and message
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Signature bytes are not DER
    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    /// Not a compressed secp256k1 point
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Not a 32-byte scalar in curve range
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Child key derivation produced an unusable key
    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),
}
