//! Permission repository over any [`KeyValueStore`].
//!
//! ## Key Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `perm:{len u16 BE}{recipient}{box}\0{0x00}` | box-wide default row |
//! | `perm:{len u16 BE}{recipient}{box}\0{0x01}{sender}` | sender row |
//! | `fee:{box}` | delivery fee (i64 BE) |
//!
//! The NUL terminator after the box name keeps a prefix scan in box order,
//! and the sender tag puts the box-wide default ahead of sender rows. Box
//! names containing NUL would make keys ambiguous; `PermissionEngine`
//! rejects them before they reach this layer.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use shared_types::{IdentityKey, KeyValueStore};
use std::sync::Arc;

use crate::domain::entities::{MessagePermission, PermissionKey};
use crate::domain::errors::PermissionError;
use crate::ports::outbound::PermissionRepository;

const PERM_PREFIX: &[u8] = b"perm:";
const FEE_PREFIX: &[u8] = b"fee:";
const DEFAULT_TAG: u8 = 0x00;
const SENDER_TAG: u8 = 0x01;

fn recipient_prefix(recipient: &IdentityKey) -> Vec<u8> {
    let r = recipient.as_str().as_bytes();
    let mut key = PERM_PREFIX.to_vec();
    key.extend_from_slice(&(r.len() as u16).to_be_bytes());
    key.extend_from_slice(r);
    key
}

fn box_prefix(recipient: &IdentityKey, message_box: &str) -> Vec<u8> {
    let mut key = recipient_prefix(recipient);
    key.extend_from_slice(message_box.as_bytes());
    key.push(0);
    key
}

fn permission_key(key: &PermissionKey) -> Vec<u8> {
    let mut out = box_prefix(&key.recipient, &key.message_box);
    match &key.sender {
        None => out.push(DEFAULT_TAG),
        Some(sender) => {
            out.push(SENDER_TAG);
            out.extend_from_slice(sender.as_str().as_bytes());
        }
    }
    out
}

fn fee_key(message_box: &str) -> Vec<u8> {
    let mut key = FEE_PREFIX.to_vec();
    key.extend_from_slice(message_box.as_bytes());
    key
}

fn encode(row: &MessagePermission) -> Result<Vec<u8>, PermissionError> {
    bincode::serialize(row).map_err(|e| PermissionError::Repository(e.to_string()))
}

fn decode(raw: &[u8]) -> Result<MessagePermission, PermissionError> {
    bincode::deserialize(raw).map_err(|e| PermissionError::Repository(e.to_string()))
}

pub struct KvPermissionRepository<S: KeyValueStore> {
    kv: Arc<S>,
    /// Serializes read-modify-write upserts.
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> KvPermissionRepository<S> {
    pub fn new(kv: Arc<S>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl<S: KeyValueStore + 'static> PermissionRepository for KvPermissionRepository<S> {
    async fn get(&self, key: &PermissionKey) -> Result<Option<MessagePermission>, PermissionError> {
        self.kv
            .get(&permission_key(key))?
            .map(|raw| decode(&raw))
            .transpose()
    }

    async fn insert_if_absent(
        &self,
        row: MessagePermission,
    ) -> Result<MessagePermission, PermissionError> {
        let (stored, _) = self
            .kv
            .put_if_absent(&permission_key(&row.key()), &encode(&row)?)?;
        decode(&stored)
    }

    async fn upsert(
        &self,
        key: PermissionKey,
        recipient_fee: i64,
    ) -> Result<MessagePermission, PermissionError> {
        let raw_key = permission_key(&key);
        let _guard = self.write_lock.lock();

        let row = match self.kv.get(&raw_key)? {
            Some(raw) => {
                let mut row = decode(&raw)?;
                row.recipient_fee = recipient_fee;
                row.updated_at = Utc::now();
                row
            }
            None => MessagePermission::new(key, recipient_fee),
        };
        self.kv.put(&raw_key, &encode(&row)?)?;
        Ok(row)
    }

    async fn list_for_recipient(
        &self,
        recipient: &IdentityKey,
        message_box: Option<&str>,
    ) -> Result<Vec<MessagePermission>, PermissionError> {
        let prefix = match message_box {
            Some(b) => box_prefix(recipient, b),
            None => recipient_prefix(recipient),
        };
        self.kv
            .prefix_scan(&prefix)?
            .into_iter()
            .map(|(_, raw)| decode(&raw))
            .collect()
    }

    async fn delivery_fee(&self, message_box: &str) -> Result<Option<i64>, PermissionError> {
        let Some(raw) = self.kv.get(&fee_key(message_box))? else {
            return Ok(None);
        };
        let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
            PermissionError::Repository(format!("corrupted delivery fee for `{message_box}`"))
        })?;
        Ok(Some(i64::from_be_bytes(bytes)))
    }

    async fn set_delivery_fee(&self, message_box: &str, fee: i64) -> Result<(), PermissionError> {
        self.kv.put(&fee_key(message_box), &fee.to_be_bytes())?;
        Ok(())
    }
}
