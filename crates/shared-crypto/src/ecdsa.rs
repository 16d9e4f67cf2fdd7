//! # ECDSA Signatures (secp256k1)
//!
//! Identity key pairs for the relay. Public keys travel as compressed SEC1
//! points (33 bytes, hex in [`IdentityKey`]); signatures travel DER encoded.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization
//! - Secret scalars are zeroized on drop

use crate::CryptoError;
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use k256::{PublicKey, SecretKey};
use shared_types::IdentityKey;
use zeroize::Zeroize;

/// Compressed secp256k1 public key (33 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey([u8; 33]);

impl Secp256k1PublicKey {
    /// Create from compressed bytes (33 bytes, starting with 0x02 or 0x03).
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, CryptoError> {
        // Validate it's a valid compressed point
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Parse the hex form carried by an [`IdentityKey`].
    pub fn from_identity(key: &IdentityKey) -> Result<Self, CryptoError> {
        let bytes = key.to_bytes().map_err(|_| CryptoError::InvalidPublicKey)?;
        let bytes: [u8; 33] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_bytes(bytes)
    }

    /// Convert a curve point into its compressed form.
    pub fn from_point(point: &PublicKey) -> Self {
        let encoded = k256::elliptic_curve::sec1::ToEncodedPoint::to_encoded_point(point, true);
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(encoded.as_bytes());
        Self(bytes)
    }

    /// Get raw compressed bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// The curve point.
    pub fn to_point(&self) -> Result<PublicKey, CryptoError> {
        PublicKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Hex identity form.
    pub fn to_identity(&self) -> IdentityKey {
        IdentityKey::new(hex::encode(self.0))
    }

    /// Verify a DER signature over `message` (SHA-256 is applied internally).
    pub fn verify_der(&self, message: &[u8], signature_der: &[u8]) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;

        let sig =
            Signature::from_der(signature_der).map_err(|_| CryptoError::InvalidSignatureFormat)?;

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// secp256k1 ECDSA keypair.
pub struct Secp256k1KeyPair {
    secret: SecretKey,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut rand::thread_rng());
        Self { secret }
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let secret =
            SecretKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { secret })
    }

    /// Create from a hex encoded 32-byte secret.
    pub fn from_hex(secret_hex: &str) -> Result<Self, CryptoError> {
        let mut bytes = hex::decode(secret_hex).map_err(|_| CryptoError::InvalidPrivateKey)?;
        let result = <[u8; 32]>::try_from(bytes.as_slice())
            .map_err(|_| CryptoError::InvalidPrivateKey)
            .and_then(Self::from_bytes);
        bytes.zeroize();
        result
    }

    /// Wrap an already-derived secret.
    pub fn from_secret(secret: SecretKey) -> Self {
        Self { secret }
    }

    /// Get public key (compressed, 33 bytes).
    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey::from_point(&self.secret.public_key())
    }

    /// The secret scalar, for child key derivation.
    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }

    /// Sign a message (deterministic RFC 6979) and return the DER encoding.
    pub fn sign_der(&self, message: &[u8]) -> Vec<u8> {
        let signing_key = SigningKey::from(&self.secret);
        let sig: Signature = signing_key.sign(message);
        let sig = sig.normalize_s().unwrap_or(sig);
        sig.to_der().as_bytes().to_vec()
    }

    /// Get secret key bytes (for serialization).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes().into()
    }
}

impl Drop for Secp256k1KeyPair {
    fn drop(&mut self) {
        // Zeroize secret key material
        let mut bytes: [u8; 32] = self.secret.to_bytes().into();
        bytes.zeroize();
    }
}
