//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: [`IdentityKey`]
//! - **Discovery**: [`Advertisement`], [`AdvertisementRecord`], [`StoredAdvertisement`]
//! - **Messaging**: [`Message`], [`MessageId`]

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::IdentityKeyError;

/// Protocol tag carried by every advertisement.
pub const ADVERTISEMENT_PROTOCOL: &str = "MB_AD";

/// Advertisement format version.
pub const ADVERTISEMENT_VERSION: &str = "1.0";

/// Length of a compressed secp256k1 public key.
pub const IDENTITY_KEY_LEN: usize = 33;

/// Globally unique message identifier chosen by the sender.
pub type MessageId = String;

// =============================================================================
// IDENTITY
// =============================================================================

/// Hex-encoded compressed secp256k1 public key that names a peer.
///
/// `new` does not validate, because identities also arrive as opaque
/// strings from authorization headers. Use [`IdentityKey::parse`] when the
/// key must be a real curve point encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Wrap an identity string without validation.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Parse and validate a compressed public key in hex.
    pub fn parse(key: &str) -> Result<Self, IdentityKeyError> {
        let bytes = hex::decode(key).map_err(|_| IdentityKeyError::NotHex)?;
        Self::from_bytes(&bytes)
    }

    /// Build from raw compressed point bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityKeyError> {
        if bytes.len() != IDENTITY_KEY_LEN {
            return Err(IdentityKeyError::InvalidLength(bytes.len()));
        }
        if bytes[0] != 0x02 && bytes[0] != 0x03 {
            return Err(IdentityKeyError::InvalidPrefix(bytes[0]));
        }
        Ok(Self(hex::encode(bytes)))
    }

    /// Decode the hex form back to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, IdentityKeyError> {
        hex::decode(&self.0).map_err(|_| IdentityKeyError::NotHex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Render a timestamp the way advertisements carry it
/// (`2025-01-01T00:00:00.000Z`).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an advertisement timestamp. Returns `None` for anything that is not
/// a valid RFC 3339 date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// =============================================================================
// DISCOVERY
// =============================================================================

/// A signed claim that `host` currently serves `identity_key`.
///
/// Immutable once signed. A newer advertisement supersedes it; nothing
/// mutates it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advertisement {
    pub identity_key: IdentityKey,
    pub host: String,
    pub timestamp: String,
    pub nonce: String,
    /// DER signature, hex encoded.
    pub signature: String,
    pub protocol: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
}

/// Input to the advertisement store. `txid` is optional at the type level so
/// that the store can reject records that never reached the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisementRecord {
    pub identity_key: IdentityKey,
    pub host: String,
    pub timestamp: String,
    pub nonce: String,
    pub signature: String,
    pub txid: Option<String>,
    pub output_index: Option<u32>,
}

impl AdvertisementRecord {
    /// Build a record from a signed advertisement and the output that
    /// carried it on chain.
    pub fn from_advertisement(ad: &Advertisement, txid: impl Into<String>, output_index: u32) -> Self {
        Self {
            identity_key: ad.identity_key.clone(),
            host: ad.host.clone(),
            timestamp: ad.timestamp.clone(),
            nonce: ad.nonce.clone(),
            signature: ad.signature.clone(),
            txid: Some(txid.into()),
            output_index: Some(output_index),
        }
    }
}

/// Persisted advertisement row. Append-only, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAdvertisement {
    /// Monotonic insertion id, used as the tie-break on equal `created_at`.
    pub row_id: u64,
    pub identity_key: IdentityKey,
    pub host: String,
    pub timestamp: String,
    pub nonce: String,
    pub signature: String,
    pub txid: String,
    pub output_index: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl StoredAdvertisement {
    /// Recency key: later `created_at` wins, then the higher row id.
    pub fn recency(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.row_id)
    }

    /// Resolution key: the signed `timestamp` decides, then [`recency`].
    ///
    /// A replayed older advertisement gets a fresh `created_at` but keeps its
    /// signed timestamp, so it never outranks a newer one. An unparseable
    /// timestamp ranks below every valid one.
    ///
    /// [`recency`]: StoredAdvertisement::recency
    pub fn precedence(&self) -> (Option<DateTime<Utc>>, DateTime<Utc>, u64) {
        (parse_timestamp(&self.timestamp), self.created_at, self.row_id)
    }
}

// =============================================================================
// MESSAGING
// =============================================================================

/// A message routed through the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: MessageId,
    pub message_box: String,
    pub body: String,
    pub sender: IdentityKey,
    pub recipient: IdentityKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(
        message_id: impl Into<MessageId>,
        message_box: impl Into<String>,
        body: impl Into<String>,
        sender: IdentityKey,
        recipient: IdentityKey,
    ) -> Self {
        let now = Utc::now();
        Self {
            message_id: message_id.into(),
            message_box: message_box.into(),
            body: body.into(),
            sender,
            recipient,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_identity_key_parse_rejects_bad_prefix() {
        let mut bytes = [0x11u8; 33];
        bytes[0] = 0x04;
        assert_eq!(
            IdentityKey::from_bytes(&bytes),
            Err(IdentityKeyError::InvalidPrefix(0x04))
        );
    }

    #[test]
    fn test_identity_key_parse_rejects_length() {
        assert_eq!(
            IdentityKey::parse("02abcd"),
            Err(IdentityKeyError::InvalidLength(3))
        );
    }

    #[test]
    fn test_identity_key_round_trips_bytes() {
        let mut bytes = [0x22u8; 33];
        bytes[0] = 0x03;
        let key = IdentityKey::from_bytes(&bytes).unwrap();
        assert_eq!(key.to_bytes().unwrap(), bytes.to_vec());
        assert_eq!(key.as_str().len(), 66);
    }

    #[test]
    fn test_timestamp_format_uses_millis_and_z() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2025-01-01T00:00:00.000Z").is_some());
        assert!(parse_timestamp("2025-01-01T10:00:00+02:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_recency_breaks_ties_on_row_id() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let make = |row_id| StoredAdvertisement {
            row_id,
            identity_key: IdentityKey::new("k"),
            host: "https://a.example".into(),
            timestamp: format_timestamp(at),
            nonce: "n".into(),
            signature: "s".into(),
            txid: "t".into(),
            output_index: Some(0),
            created_at: at,
        };
        assert!(make(2).recency() > make(1).recency());
    }

    #[test]
    fn test_precedence_prefers_signed_timestamp_over_insertion() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let newer = StoredAdvertisement {
            row_id: 2,
            identity_key: IdentityKey::new("k"),
            host: "https://new.example".into(),
            timestamp: "2025-06-01T00:00:00.000Z".into(),
            nonce: "n".into(),
            signature: "s".into(),
            txid: "t2".into(),
            output_index: Some(0),
            created_at: at,
        };
        let replayed = StoredAdvertisement {
            row_id: 3,
            host: "https://old.example".into(),
            timestamp: "2025-01-01T00:00:00.000Z".into(),
            txid: "t3".into(),
            created_at: at + chrono::Duration::days(1),
            ..newer.clone()
        };
        let garbled = StoredAdvertisement {
            row_id: 4,
            timestamp: "not a date".into(),
            ..replayed.clone()
        };

        assert!(newer.precedence() > replayed.precedence());
        assert!(replayed.precedence() > garbled.precedence());
        assert!(replayed.recency() > newer.recency());
    }
}
