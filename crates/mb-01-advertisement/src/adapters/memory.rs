//! In-memory advertisement store for tests and single-process deployments.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shared_types::{AdvertisementRecord, IdentityKey, StoredAdvertisement};
use tracing::debug;

use super::{build_row, sort_by_recency};
use crate::domain::errors::AdvertisementError;
use crate::ports::outbound::{require_txid, AdvertisementStore};

/// Vector-backed append-only store.
#[derive(Default)]
pub struct InMemoryAdvertisementStore {
    rows: RwLock<Vec<StoredAdvertisement>>,
}

impl InMemoryAdvertisementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl AdvertisementStore for InMemoryAdvertisementStore {
    async fn store(
        &self,
        record: AdvertisementRecord,
    ) -> Result<StoredAdvertisement, AdvertisementError> {
        let txid = require_txid(&record)?;
        let mut rows = self.rows.write();
        let row_id = rows.len() as u64 + 1;
        let row = build_row(record, row_id, txid, Utc::now());
        debug!(identity_key = %row.identity_key, host = %row.host, row_id, "advertisement stored");
        rows.push(row.clone());
        Ok(row)
    }

    async fn latest_host_for(
        &self,
        identity_key: &IdentityKey,
    ) -> Result<Option<String>, AdvertisementError> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|row| &row.identity_key == identity_key)
            .max_by_key(|row| row.precedence())
            .map(|row| row.host.clone()))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredAdvertisement>, AdvertisementError> {
        let mut rows = self.rows.read().clone();
        sort_by_recency(&mut rows);
        rows.truncate(limit);
        Ok(rows)
    }
}
