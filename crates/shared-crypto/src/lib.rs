//! # Shared Crypto - Identity Keys and Signing Capability
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `ecdsa` | secp256k1 | Identity key pairs, DER signatures |
//! | `derivation` | ECDH + HMAC-SHA256 | Child keys bound to a protocol, key id and counterparty |
//! | `capability` | - | `SigningCapability` trait and the local `KeyPairSigner` |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S signatures
//! - **Child keys**: a signature for counterparty "anyone" is verifiable by
//!   any party that knows only the signer's identity key

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capability;
pub mod derivation;
pub mod ecdsa;
pub mod errors;

// Re-exports
pub use capability::{
    Counterparty, KeyPairSigner, ProtocolId, PublicKeyRequest, SigningCapability, SigningError,
};
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey};
pub use errors::CryptoError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
