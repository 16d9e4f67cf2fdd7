//! # Signing Capability
//!
//! The interface through which the relay obtains and checks signatures on
//! behalf of an identity. A wallet process, a hardware signer or the local
//! [`KeyPairSigner`] may stand behind it.
//!
//! All operations are synchronous: they are local elliptic-curve work with
//! no I/O, which lets admission control run them on a thread pool.

use base64::Engine;
use k256::PublicKey;
use rand::RngCore;
use shared_types::IdentityKey;
use thiserror::Error;

use crate::derivation::{anyone_public, anyone_secret, derive_child_public, derive_child_secret};
use crate::ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey};
use crate::CryptoError;

/// Errors surfaced by a signing capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// The counterparty is not a usable public key.
    #[error("Invalid counterparty: {0}")]
    InvalidCounterparty(String),

    /// Deriving the child key failed.
    #[error("Key derivation failed: {0}")]
    Derivation(#[from] CryptoError),

    /// The protocol identifier is not acceptable.
    #[error("Invalid protocol id: {0}")]
    InvalidProtocol(String),

    /// The backing signer could not be reached or refused.
    #[error("Signer unavailable: {0}")]
    Unavailable(String),
}

/// Protocol identifier used to bind a child key to a use case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolId {
    /// Security level (0, 1 or 2).
    pub security_level: u8,
    /// Lowercase protocol name.
    pub name: String,
}

impl ProtocolId {
    /// Create a protocol identifier.
    pub fn new(security_level: u8, name: impl Into<String>) -> Self {
        Self {
            security_level,
            name: name.into(),
        }
    }

    /// Invoice number `"<level>-<name>-<key_id>"` fed into derivation.
    pub fn invoice_number(&self, key_id: &str) -> Result<String, SigningError> {
        if self.security_level > 2 {
            return Err(SigningError::InvalidProtocol(format!(
                "security level {} out of range",
                self.security_level
            )));
        }
        let name = self.name.trim();
        if name.len() < 5 || name.len() > 400 {
            return Err(SigningError::InvalidProtocol(format!(
                "protocol name length {} out of range",
                name.len()
            )));
        }
        if key_id.is_empty() || key_id.len() > 800 {
            return Err(SigningError::InvalidProtocol("key id length out of range".into()));
        }
        Ok(format!("{}-{}-{}", self.security_level, name.to_lowercase(), key_id))
    }
}

/// The party a child key is shared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Counterparty {
    /// Public verifier: anyone holding the signer's identity key.
    Anyone,
    /// The capability's own identity.
    Myself,
    /// A specific identity.
    Other(IdentityKey),
}

/// Which public key to return from [`SigningCapability::get_public_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyRequest {
    /// The root identity key.
    Identity,
    /// A derived child key.
    Derived {
        /// Protocol the key is bound to.
        protocol_id: ProtocolId,
        /// Key id within the protocol.
        key_id: String,
        /// Counterparty the key is shared with.
        counterparty: Counterparty,
        /// `true` for our own child key, `false` for the counterparty's.
        for_self: bool,
    },
}

/// Produces and checks signatures on behalf of an identity key.
pub trait SigningCapability: Send + Sync {
    /// Return the identity key or a derived child key.
    fn get_public_key(&self, request: &PublicKeyRequest) -> Result<IdentityKey, SigningError>;

    /// Sign `data` with the child key for `(protocol_id, key_id, counterparty)`.
    fn create_signature(
        &self,
        data: &[u8],
        protocol_id: &ProtocolId,
        key_id: &str,
        counterparty: &Counterparty,
    ) -> Result<Vec<u8>, SigningError>;

    /// Check a DER `signature` made by `counterparty` over `data`.
    ///
    /// An invalid or malformed signature is `Ok(false)`; errors are reserved
    /// for unusable inputs such as a counterparty that is not a curve point.
    fn verify_signature(
        &self,
        data: &[u8],
        signature: &[u8],
        protocol_id: &ProtocolId,
        key_id: &str,
        counterparty: &Counterparty,
    ) -> Result<bool, SigningError>;

    /// Fresh random nonce, base64 encoded.
    fn create_nonce(&self) -> Result<String, SigningError>;
}

/// Signing capability backed by an in-process secp256k1 key pair.
pub struct KeyPairSigner {
    keypair: Secp256k1KeyPair,
}

impl KeyPairSigner {
    /// Wrap an existing key pair.
    pub fn new(keypair: Secp256k1KeyPair) -> Self {
        Self { keypair }
    }

    /// Random identity.
    pub fn generate() -> Self {
        Self::new(Secp256k1KeyPair::generate())
    }

    /// The public "anyone" signer, able to verify signatures made for
    /// [`Counterparty::Anyone`].
    pub fn anyone() -> Self {
        Self::new(Secp256k1KeyPair::from_secret(anyone_secret()))
    }

    /// Identity from a hex encoded secret.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, CryptoError> {
        Secp256k1KeyPair::from_hex(secret_hex).map(Self::new)
    }

    /// Root identity key.
    pub fn identity_key(&self) -> IdentityKey {
        self.keypair.public_key().to_identity()
    }

    fn counterparty_point(&self, counterparty: &Counterparty) -> Result<PublicKey, SigningError> {
        match counterparty {
            Counterparty::Anyone => Ok(anyone_public()),
            Counterparty::Myself => Ok(self.keypair.secret().public_key()),
            Counterparty::Other(key) => Secp256k1PublicKey::from_identity(key)
                .and_then(|pk| pk.to_point())
                .map_err(|_| SigningError::InvalidCounterparty(key.to_string())),
        }
    }

    fn child_public(
        &self,
        protocol_id: &ProtocolId,
        key_id: &str,
        counterparty: &Counterparty,
        for_self: bool,
    ) -> Result<PublicKey, SigningError> {
        let invoice = protocol_id.invoice_number(key_id)?;
        let other = self.counterparty_point(counterparty)?;
        let child = if for_self {
            derive_child_secret(self.keypair.secret(), &other, &invoice)?.public_key()
        } else {
            derive_child_public(&other, self.keypair.secret(), &invoice)?
        };
        Ok(child)
    }
}

impl SigningCapability for KeyPairSigner {
    fn get_public_key(&self, request: &PublicKeyRequest) -> Result<IdentityKey, SigningError> {
        match request {
            PublicKeyRequest::Identity => Ok(self.identity_key()),
            PublicKeyRequest::Derived {
                protocol_id,
                key_id,
                counterparty,
                for_self,
            } => {
                let child = self.child_public(protocol_id, key_id, counterparty, *for_self)?;
                Ok(Secp256k1PublicKey::from_point(&child).to_identity())
            }
        }
    }

    fn create_signature(
        &self,
        data: &[u8],
        protocol_id: &ProtocolId,
        key_id: &str,
        counterparty: &Counterparty,
    ) -> Result<Vec<u8>, SigningError> {
        let invoice = protocol_id.invoice_number(key_id)?;
        let other = self.counterparty_point(counterparty)?;
        let child = derive_child_secret(self.keypair.secret(), &other, &invoice)?;
        Ok(Secp256k1KeyPair::from_secret(child).sign_der(data))
    }

    fn verify_signature(
        &self,
        data: &[u8],
        signature: &[u8],
        protocol_id: &ProtocolId,
        key_id: &str,
        counterparty: &Counterparty,
    ) -> Result<bool, SigningError> {
        // Our own signatures were made with our own child secret.
        let for_self = matches!(counterparty, Counterparty::Myself);
        let child = self.child_public(protocol_id, key_id, counterparty, for_self)?;
        match Secp256k1PublicKey::from_point(&child).verify_der(data, signature) {
            Ok(()) => Ok(true),
            Err(CryptoError::SignatureVerificationFailed)
            | Err(CryptoError::InvalidSignatureFormat) => Ok(false),
            Err(e) => Err(SigningError::Derivation(e)),
        }
    }

    fn create_nonce(&self) -> Result<String, SigningError> {
        let mut bytes = [0u8; 32];
        rand::thread_rng()
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SigningError::Unavailable(e.to_string()))?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol() -> ProtocolId {
        ProtocolId::new(1, "messagebox advertisement")
    }

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(
            protocol().invoice_number("1").unwrap(),
            "1-messagebox advertisement-1"
        );
    }

    #[test]
    fn test_invoice_number_rejects_bad_level() {
        let bad = ProtocolId::new(3, "messagebox advertisement");
        assert!(matches!(
            bad.invoice_number("1"),
            Err(SigningError::InvalidProtocol(_))
        ));
    }

    #[test]
    fn test_anyone_signature_verified_by_anyone() {
        let signer = KeyPairSigner::generate();
        let verifier = KeyPairSigner::anyone();
        let data = b"payload";

        let sig = signer
            .create_signature(data, &protocol(), "1", &Counterparty::Anyone)
            .unwrap();
        let valid = verifier
            .verify_signature(
                data,
                &sig,
                &protocol(),
                "1",
                &Counterparty::Other(signer.identity_key()),
            )
            .unwrap();

        assert!(valid);
    }

    #[test]
    fn test_wrong_counterparty_does_not_verify() {
        let signer = KeyPairSigner::generate();
        let impostor = KeyPairSigner::generate();
        let verifier = KeyPairSigner::anyone();

        let sig = signer
            .create_signature(b"payload", &protocol(), "1", &Counterparty::Anyone)
            .unwrap();
        let valid = verifier
            .verify_signature(
                b"payload",
                &sig,
                &protocol(),
                "1",
                &Counterparty::Other(impostor.identity_key()),
            )
            .unwrap();

        assert!(!valid);
    }

    #[test]
    fn test_self_signature_round_trip() {
        let signer = KeyPairSigner::generate();
        let sig = signer
            .create_signature(b"note", &protocol(), "7", &Counterparty::Myself)
            .unwrap();
        assert!(signer
            .verify_signature(b"note", &sig, &protocol(), "7", &Counterparty::Myself)
            .unwrap());
    }

    #[test]
    fn test_malformed_signature_is_false_not_error() {
        let signer = KeyPairSigner::generate();
        let valid = KeyPairSigner::anyone()
            .verify_signature(
                b"payload",
                b"not der",
                &protocol(),
                "1",
                &Counterparty::Other(signer.identity_key()),
            )
            .unwrap();
        assert!(!valid);
    }

    #[test]
    fn test_invalid_counterparty_is_error() {
        let result = KeyPairSigner::anyone().verify_signature(
            b"payload",
            b"sig",
            &protocol(),
            "1",
            &Counterparty::Other(IdentityKey::new("zz")),
        );
        assert!(matches!(result, Err(SigningError::InvalidCounterparty(_))));
    }

    #[test]
    fn test_derived_public_key_matches_counterparty_view() {
        let signer = KeyPairSigner::generate();
        let mine = signer
            .get_public_key(&PublicKeyRequest::Derived {
                protocol_id: protocol(),
                key_id: "1".into(),
                counterparty: Counterparty::Anyone,
                for_self: true,
            })
            .unwrap();
        let seen_by_anyone = KeyPairSigner::anyone()
            .get_public_key(&PublicKeyRequest::Derived {
                protocol_id: protocol(),
                key_id: "1".into(),
                counterparty: Counterparty::Other(signer.identity_key()),
                for_self: false,
            })
            .unwrap();
        assert_eq!(mine, seen_by_anyone);
    }

    #[test]
    fn test_nonces_are_fresh() {
        let signer = KeyPairSigner::generate();
        let a = signer.create_nonce().unwrap();
        let b = signer.create_nonce().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 44);
    }
}
