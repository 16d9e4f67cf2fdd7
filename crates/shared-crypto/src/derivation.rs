//! # Child Key Derivation
//!
//! Counterparty-bound child keys (BRC-42 style).
//!
//! ```text
//! shared  = compressed(ECDH(own_secret, counterparty_public))
//! tweak   = HMAC-SHA256(key = shared, msg = invoice_number) mod n
//! child   = own_secret + tweak              (signer side)
//! childPk = counterparty_public + tweak·G   (verifier side)
//! ```
//!
//! Both sides compute the same ECDH point, so the verifier's `childPk`
//! matches the public half of the signer's `child`. The "anyone" key has
//! secret scalar 1, which makes the shared point equal to the signer's own
//! public key: such signatures are verifiable from the identity key alone.

use hmac::{Hmac, Mac};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{ProjectivePoint, PublicKey, Scalar, SecretKey, U256};
use sha2::Sha256;

use crate::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Secret key of the well-known "anyone" identity (scalar 1).
pub fn anyone_secret() -> SecretKey {
    let mut bytes = [0u8; 32];
    bytes[31] = 1;
    // Scalar 1 is always in range.
    SecretKey::from_bytes((&bytes).into()).unwrap_or_else(|_| unreachable!("scalar 1 is valid"))
}

/// Public key of the "anyone" identity (the generator point).
pub fn anyone_public() -> PublicKey {
    anyone_secret().public_key()
}

/// Compressed ECDH point shared between `secret` and `counterparty`.
pub fn shared_secret(secret: &SecretKey, counterparty: &PublicKey) -> [u8; 33] {
    let point = (counterparty.to_projective() * *secret.to_nonzero_scalar()).to_affine();
    let encoded = point.to_encoded_point(true);
    let mut out = [0u8; 33];
    out.copy_from_slice(encoded.as_bytes());
    out
}

fn invoice_tweak(shared: &[u8; 33], invoice_number: &str) -> Result<Scalar, CryptoError> {
    let mut mac = HmacSha256::new_from_slice(shared)
        .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;
    mac.update(invoice_number.as_bytes());
    let digest = mac.finalize().into_bytes();
    Ok(<Scalar as Reduce<U256>>::reduce_bytes(&digest))
}

/// Derive the signer's child secret for `invoice_number`.
pub fn derive_child_secret(
    secret: &SecretKey,
    counterparty: &PublicKey,
    invoice_number: &str,
) -> Result<SecretKey, CryptoError> {
    let shared = shared_secret(secret, counterparty);
    let tweak = invoice_tweak(&shared, invoice_number)?;
    let child = *secret.to_nonzero_scalar() + tweak;
    SecretKey::from_bytes(&child.to_bytes())
        .map_err(|_| CryptoError::DerivationFailed("child secret is zero".into()))
}

/// Derive the counterparty's child public key as seen by the holder of
/// `secret`.
pub fn derive_child_public(
    counterparty: &PublicKey,
    secret: &SecretKey,
    invoice_number: &str,
) -> Result<PublicKey, CryptoError> {
    let shared = shared_secret(secret, counterparty);
    let tweak = invoice_tweak(&shared, invoice_number)?;
    let point = counterparty.to_projective() + ProjectivePoint::GENERATOR * tweak;
    PublicKey::from_affine(point.to_affine())
        .map_err(|_| CryptoError::DerivationFailed("child public key is identity".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVOICE: &str = "1-messagebox advertisement-1";

    #[test]
    fn test_anyone_public_is_generator() {
        let expected = PublicKey::from_affine(ProjectivePoint::GENERATOR.to_affine()).unwrap();
        assert_eq!(anyone_public(), expected);
    }

    #[test]
    fn test_shared_secret_is_symmetric() {
        let a = SecretKey::random(&mut rand::thread_rng());
        let b = SecretKey::random(&mut rand::thread_rng());
        assert_eq!(
            shared_secret(&a, &b.public_key()),
            shared_secret(&b, &a.public_key())
        );
    }

    #[test]
    fn test_child_keys_agree_for_anyone() {
        let signer = SecretKey::random(&mut rand::thread_rng());

        let child_secret = derive_child_secret(&signer, &anyone_public(), INVOICE).unwrap();
        let child_public =
            derive_child_public(&signer.public_key(), &anyone_secret(), INVOICE).unwrap();

        assert_eq!(child_secret.public_key(), child_public);
    }

    #[test]
    fn test_child_keys_agree_for_specific_counterparty() {
        let alice = SecretKey::random(&mut rand::thread_rng());
        let bob = SecretKey::random(&mut rand::thread_rng());

        let child_secret = derive_child_secret(&alice, &bob.public_key(), INVOICE).unwrap();
        let child_public = derive_child_public(&alice.public_key(), &bob, INVOICE).unwrap();

        assert_eq!(child_secret.public_key(), child_public);
    }

    #[test]
    fn test_invoice_number_changes_child() {
        let signer = SecretKey::random(&mut rand::thread_rng());
        let one = derive_child_secret(&signer, &anyone_public(), INVOICE).unwrap();
        let two = derive_child_secret(&signer, &anyone_public(), "1-messagebox advertisement-2")
            .unwrap();
        assert_ne!(one.public_key(), two.public_key());
    }
}
