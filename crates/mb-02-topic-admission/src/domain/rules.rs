//! # Admission Rules
//!
//! Per-output checks. Each returns the first reason the output is skipped;
//! `Ok(())` means admit.

use mb_01_advertisement::{decode_locking_script, verify};
use shared_crypto::SigningCapability;
use shared_types::{parse_timestamp, Advertisement};
use std::fmt;

use super::entities::AdmissionLimits;

/// Why an output was not admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Not a push-drop token, or a field is missing or empty.
    Undecodable(String),
    HostMissingDomainSeparator,
    HostTooLong(usize),
    InvalidTimestamp,
    NonceTooLong(usize),
    InvalidSignature,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Undecodable(reason) => write!(f, "undecodable: {reason}"),
            SkipReason::HostMissingDomainSeparator => f.write_str("host has no domain separator"),
            SkipReason::HostTooLong(len) => write!(f, "host is {len} bytes"),
            SkipReason::InvalidTimestamp => f.write_str("timestamp does not parse"),
            SkipReason::NonceTooLong(len) => write!(f, "nonce is {len} bytes"),
            SkipReason::InvalidSignature => f.write_str("signature does not verify"),
        }
    }
}

/// Structural validation of a decoded advertisement.
pub fn check_advertisement(ad: &Advertisement, limits: &AdmissionLimits) -> Result<(), SkipReason> {
    if !ad.host.contains('.') {
        return Err(SkipReason::HostMissingDomainSeparator);
    }
    if ad.host.len() > limits.max_host_bytes {
        return Err(SkipReason::HostTooLong(ad.host.len()));
    }
    if parse_timestamp(&ad.timestamp).is_none() {
        return Err(SkipReason::InvalidTimestamp);
    }
    if ad.nonce.len() > limits.max_nonce_bytes {
        return Err(SkipReason::NonceTooLong(ad.nonce.len()));
    }
    Ok(())
}

/// Full check of one output script: decode, structure, then signature.
pub fn evaluate_output(
    locking_script: &[u8],
    verifier: &dyn SigningCapability,
    limits: &AdmissionLimits,
) -> Result<Advertisement, SkipReason> {
    let ad = decode_locking_script(locking_script)
        .and_then(|fields| fields.into_advertisement())
        .map_err(|e| SkipReason::Undecodable(e.to_string()))?;

    check_advertisement(&ad, limits)?;

    if !verify(&ad, verifier) {
        return Err(SkipReason::InvalidSignature);
    }
    Ok(ad)
}
