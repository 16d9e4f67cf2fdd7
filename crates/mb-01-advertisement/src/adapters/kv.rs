//! Advertisement store over any [`KeyValueStore`].
//!
//! ## Key Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `adv:seq` | last allocated row id (u64 BE) |
//! | `adv:row:{row_id BE}` | bincode `StoredAdvertisement` |
//! | `adv:idx:{len u16 BE}{identity}{row_id BE}` | empty |
//!
//! Every insert writes all three keys in one atomic batch.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use shared_types::{
    AdvertisementRecord, BatchOperation, IdentityKey, KeyValueStore, StoredAdvertisement,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::{build_row, sort_by_recency};
use crate::domain::errors::AdvertisementError;
use crate::ports::outbound::{require_txid, AdvertisementStore};

const SEQ_KEY: &[u8] = b"adv:seq";
const ROW_PREFIX: &[u8] = b"adv:row:";
const INDEX_PREFIX: &[u8] = b"adv:idx:";

fn row_key(row_id: u64) -> Vec<u8> {
    let mut key = ROW_PREFIX.to_vec();
    key.extend_from_slice(&row_id.to_be_bytes());
    key
}

fn index_prefix(identity_key: &IdentityKey) -> Vec<u8> {
    let identity = identity_key.as_str().as_bytes();
    let mut key = INDEX_PREFIX.to_vec();
    key.extend_from_slice(&(identity.len() as u16).to_be_bytes());
    key.extend_from_slice(identity);
    key
}

fn index_key(identity_key: &IdentityKey, row_id: u64) -> Vec<u8> {
    let mut key = index_prefix(identity_key);
    key.extend_from_slice(&row_id.to_be_bytes());
    key
}

fn decode_u64(key: &[u8], raw: &[u8]) -> Result<u64, AdvertisementError> {
    let bytes: [u8; 8] = raw.try_into().map_err(|_| {
        AdvertisementError::Repository(format!(
            "corrupted row id under {}",
            String::from_utf8_lossy(key)
        ))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

/// Append-only advertisement rows with a per-identity index.
pub struct KvAdvertisementStore<S: KeyValueStore> {
    kv: Arc<S>,
    /// Last allocated row id. Held across the batch write so ids stay
    /// strictly increasing in commit order.
    seq: Mutex<u64>,
}

impl<S: KeyValueStore> KvAdvertisementStore<S> {
    /// Open the store, resuming the row sequence from the backing store.
    pub fn open(kv: Arc<S>) -> Result<Self, AdvertisementError> {
        let seq = match kv.get(SEQ_KEY)? {
            Some(raw) => decode_u64(SEQ_KEY, &raw)?,
            None => 0,
        };
        info!(last_row_id = seq, "advertisement store opened");
        Ok(Self {
            kv,
            seq: Mutex::new(seq),
        })
    }

    fn load_row(&self, row_id: u64) -> Result<Option<StoredAdvertisement>, AdvertisementError> {
        match self.kv.get(&row_key(row_id))? {
            Some(raw) => bincode::deserialize(&raw)
                .map(Some)
                .map_err(|e| AdvertisementError::Repository(format!("row {row_id}: {e}"))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<S: KeyValueStore + 'static> AdvertisementStore for KvAdvertisementStore<S> {
    async fn store(
        &self,
        record: AdvertisementRecord,
    ) -> Result<StoredAdvertisement, AdvertisementError> {
        let txid = require_txid(&record)?;

        let mut seq = self.seq.lock();
        let row_id = *seq + 1;
        let row = build_row(record, row_id, txid, Utc::now());
        let encoded =
            bincode::serialize(&row).map_err(|e| AdvertisementError::Repository(e.to_string()))?;

        self.kv.atomic_batch_write(vec![
            BatchOperation::put(row_key(row_id), encoded),
            BatchOperation::put(index_key(&row.identity_key, row_id), Vec::new()),
            BatchOperation::put(SEQ_KEY, row_id.to_be_bytes().to_vec()),
        ])?;
        *seq = row_id;

        debug!(
            identity_key = %row.identity_key,
            host = %row.host,
            txid = %row.txid,
            row_id,
            "advertisement stored"
        );
        Ok(row)
    }

    async fn latest_host_for(
        &self,
        identity_key: &IdentityKey,
    ) -> Result<Option<String>, AdvertisementError> {
        let prefix = index_prefix(identity_key);
        let mut latest: Option<StoredAdvertisement> = None;

        for (key, _) in self.kv.prefix_scan(&prefix)? {
            let row_id = decode_u64(&key, &key[prefix.len()..])?;
            let Some(row) = self.load_row(row_id)? else {
                continue;
            };
            if latest.as_ref().map_or(true, |l| row.precedence() > l.precedence()) {
                latest = Some(row);
            }
        }

        Ok(latest.map(|row| row.host))
    }

    async fn recent(&self, limit: usize) -> Result<Vec<StoredAdvertisement>, AdvertisementError> {
        let mut rows = self
            .kv
            .prefix_scan(ROW_PREFIX)?
            .into_iter()
            .map(|(key, raw)| {
                bincode::deserialize::<StoredAdvertisement>(&raw).map_err(|e| {
                    AdvertisementError::Repository(format!(
                        "{}: {e}",
                        String::from_utf8_lossy(&key)
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        sort_by_recency(&mut rows);
        rows.truncate(limit);
        Ok(rows)
    }
}
