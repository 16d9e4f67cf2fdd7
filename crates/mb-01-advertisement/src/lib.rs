//! # Host Advertisement Subsystem (MB-01)
//!
//! Self-certifying advertisements that bind an identity key to the host
//! currently serving its message boxes.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): canonical encoding, signing, script codec
//! - **Ports Layer** (`ports/`): the `AdvertisementStore` repository trait
//! - **Adapters Layer** (`adapters/`): in-memory and key-value backed stores
//! - **Service Layer** (`service.rs`): advertiser and overlay ingestion
//!
//! ## Protocol
//!
//! | Item | Value |
//! |------|-------|
//! | Signed fields | `host, identityKey, nonce, protocol, timestamp, version` (sorted JSON) |
//! | Protocol id | `[1, "messagebox advertisement"]`, key id `"1"` |
//! | Counterparty | anyone |
//! | On-chain form | `<identityKey> OP_CHECKSIG <host> <timestamp> <nonce> <sig> OP_2DROP OP_2DROP` |
//!
//! ## Store Invariants
//!
//! - A record without a `txid` is never persisted (`MissingTxid`)
//! - Rows are append-only; the newest `created_at` wins, then the highest row id

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{InMemoryAdvertisementStore, KvAdvertisementStore};
pub use domain::codec::{
    advertisement_protocol, canonicalize, canonicalize_pairs, sign, verify, AdvertisementDraft,
    AdvertisementFields, ADVERTISEMENT_KEY_ID,
};
pub use domain::errors::AdvertisementError;
pub use domain::script::{decode_locking_script, encode_locking_script, DecodedFields};
pub use ports::outbound::{AdvertisementStore, DEFAULT_RECENT_LIMIT};
pub use service::{AdvertisementIngestor, Advertiser, SignedAdvertisement};
