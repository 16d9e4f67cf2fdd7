//! # Advertisement Codec
//!
//! Canonical byte encoding plus the signing and verification halves.
//!
//! The signature covers the compact JSON object of the signed fields with
//! keys in lexicographic order. Signer and verifier both rebuild that byte
//! string from scratch, so field construction order never matters.

use chrono::Utc;
use serde_json::Value;
use shared_crypto::{Counterparty, ProtocolId, PublicKeyRequest, SigningCapability};
use shared_types::{
    format_timestamp, Advertisement, IdentityKey, ADVERTISEMENT_PROTOCOL, ADVERTISEMENT_VERSION,
};
use std::collections::BTreeMap;
use tracing::debug;

use super::errors::AdvertisementError;

/// Security level of the advertisement protocol id.
pub const ADVERTISEMENT_SECURITY_LEVEL: u8 = 1;

/// Protocol name of the advertisement protocol id.
pub const ADVERTISEMENT_PROTOCOL_NAME: &str = "messagebox advertisement";

/// Key id used for every advertisement signature.
pub const ADVERTISEMENT_KEY_ID: &str = "1";

/// Protocol id under which advertisement keys are derived.
pub fn advertisement_protocol() -> ProtocolId {
    ProtocolId::new(ADVERTISEMENT_SECURITY_LEVEL, ADVERTISEMENT_PROTOCOL_NAME)
}

/// The signed field set of an advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementFields {
    pub identity_key: IdentityKey,
    pub host: String,
    pub timestamp: String,
    pub nonce: String,
    pub protocol: String,
    pub version: String,
}

impl AdvertisementFields {
    /// Fields for the current protocol and version.
    pub fn new(
        identity_key: IdentityKey,
        host: impl Into<String>,
        timestamp: impl Into<String>,
        nonce: impl Into<String>,
    ) -> Self {
        Self {
            identity_key,
            host: host.into(),
            timestamp: timestamp.into(),
            nonce: nonce.into(),
            protocol: ADVERTISEMENT_PROTOCOL.to_string(),
            version: ADVERTISEMENT_VERSION.to_string(),
        }
    }

    /// The signed fields of an existing advertisement.
    pub fn of(ad: &Advertisement) -> Self {
        Self {
            identity_key: ad.identity_key.clone(),
            host: ad.host.clone(),
            timestamp: ad.timestamp.clone(),
            nonce: ad.nonce.clone(),
            protocol: ad.protocol.clone(),
            version: ad.version.clone(),
        }
    }

    fn pairs(&self) -> [(&'static str, &str); 6] {
        [
            ("identityKey", self.identity_key.as_str()),
            ("host", &self.host),
            ("timestamp", &self.timestamp),
            ("nonce", &self.nonce),
            ("protocol", &self.protocol),
            ("version", &self.version),
        ]
    }
}

/// Canonical bytes of an arbitrary string field set: compact JSON with keys
/// sorted lexicographically. A later duplicate key overwrites an earlier one.
pub fn canonicalize_pairs<K, V, I>(pairs: I) -> Vec<u8>
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    let sorted: BTreeMap<String, Value> = pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Value::String(v.into())))
        .collect();
    // BTreeMap serializes in key order; string-only values cannot fail.
    serde_json::to_vec(&sorted).unwrap_or_default()
}

/// Canonical bytes covered by an advertisement signature.
pub fn canonicalize(fields: &AdvertisementFields) -> Vec<u8> {
    canonicalize_pairs(fields.pairs())
}

/// What the advertiser supplies; everything else is resolved at signing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisementDraft {
    pub host: String,
    /// Caller-supplied nonce. A fresh one is generated when `None`.
    pub nonce: Option<String>,
    /// Fixed timestamp. The current time is used when `None`.
    pub timestamp: Option<String>,
}

impl AdvertisementDraft {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// Sign an advertisement for the signer's identity.
///
/// The signature uses counterparty "anyone", so any party holding only the
/// identity key can verify it.
pub fn sign(
    draft: &AdvertisementDraft,
    signer: &dyn SigningCapability,
) -> Result<Advertisement, AdvertisementError> {
    if draft.host.trim().is_empty() {
        return Err(AdvertisementError::field("host", "empty"));
    }

    let identity_key = signer.get_public_key(&PublicKeyRequest::Identity)?;
    let nonce = match &draft.nonce {
        Some(nonce) => nonce.clone(),
        None => signer.create_nonce()?,
    };
    let timestamp = draft
        .timestamp
        .clone()
        .unwrap_or_else(|| format_timestamp(Utc::now()));

    let fields = AdvertisementFields::new(identity_key, draft.host.clone(), timestamp, nonce);
    let signature = signer.create_signature(
        &canonicalize(&fields),
        &advertisement_protocol(),
        ADVERTISEMENT_KEY_ID,
        &Counterparty::Anyone,
    )?;

    Ok(Advertisement {
        identity_key: fields.identity_key,
        host: fields.host,
        timestamp: fields.timestamp,
        nonce: fields.nonce,
        signature: hex::encode(signature),
        protocol: fields.protocol,
        version: fields.version,
        txid: None,
    })
}

/// Check an advertisement signature against its claimed identity key.
///
/// Never fails: a malformed signature, an unusable identity key or a
/// verifier error all count as invalid.
pub fn verify(ad: &Advertisement, verifier: &dyn SigningCapability) -> bool {
    let Ok(signature) = hex::decode(&ad.signature) else {
        debug!(identity_key = %ad.identity_key, "advertisement signature is not hex");
        return false;
    };

    let data = canonicalize(&AdvertisementFields::of(ad));
    match verifier.verify_signature(
        &data,
        &signature,
        &advertisement_protocol(),
        ADVERTISEMENT_KEY_ID,
        &Counterparty::Other(ad.identity_key.clone()),
    ) {
        Ok(valid) => valid,
        Err(e) => {
            debug!(identity_key = %ad.identity_key, error = %e, "advertisement verification error");
            false
        }
    }
}
