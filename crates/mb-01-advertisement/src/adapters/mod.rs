//! # Adapters Layer
//!
//! Interchangeable [`AdvertisementStore`](crate::ports::outbound::AdvertisementStore)
//! backends.

mod kv;
mod memory;

pub use kv::KvAdvertisementStore;
pub use memory::InMemoryAdvertisementStore;

use chrono::{DateTime, Utc};
use shared_types::{AdvertisementRecord, StoredAdvertisement};

/// Materialize the persisted row for an accepted record.
fn build_row(
    record: AdvertisementRecord,
    row_id: u64,
    txid: String,
    created_at: DateTime<Utc>,
) -> StoredAdvertisement {
    StoredAdvertisement {
        row_id,
        identity_key: record.identity_key,
        host: record.host,
        timestamp: record.timestamp,
        nonce: record.nonce,
        signature: record.signature,
        txid,
        output_index: record.output_index,
        created_at,
    }
}

/// Newest first: later `created_at`, then higher row id.
fn sort_by_recency(rows: &mut [StoredAdvertisement]) {
    rows.sort_by(|a, b| b.recency().cmp(&a.recency()));
}
