//! # Outbound Ports (Driven Ports)
//!
//! Persistence required by the advertisement subsystem.

use async_trait::async_trait;
use shared_types::{AdvertisementRecord, IdentityKey, StoredAdvertisement};

use crate::domain::errors::AdvertisementError;

/// Row count returned by [`AdvertisementStore::recent`] when the caller has
/// no preference.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Append-only advertisement repository.
///
/// Production: `KvAdvertisementStore` over RocksDB (node-runtime)
/// Testing: `InMemoryAdvertisementStore`
#[async_trait]
pub trait AdvertisementStore: Send + Sync {
    /// Insert a new row.
    ///
    /// Fails with [`AdvertisementError::MissingTxid`] when the record has no
    /// transaction id, or an empty one. Never updates an existing row.
    async fn store(&self, record: AdvertisementRecord)
        -> Result<StoredAdvertisement, AdvertisementError>;

    /// Host of the row for `identity_key` with the latest signed timestamp.
    ///
    /// Rows with equal timestamps fall back to the most recently created,
    /// then the highest row id. A replayed older output never wins.
    async fn latest_host_for(
        &self,
        identity_key: &IdentityKey,
    ) -> Result<Option<String>, AdvertisementError>;

    /// Most recent rows first, at most `limit` of them.
    async fn recent(&self, limit: usize) -> Result<Vec<StoredAdvertisement>, AdvertisementError>;
}

/// Validate a record and extract its transaction id.
pub(crate) fn require_txid(record: &AdvertisementRecord) -> Result<String, AdvertisementError> {
    match record.txid.as_deref().map(str::trim) {
        Some(txid) if !txid.is_empty() => Ok(txid.to_string()),
        _ => Err(AdvertisementError::MissingTxid),
    }
}
