//! In-memory [`PermissionRepository`].

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shared_types::IdentityKey;
use std::collections::{BTreeMap, HashMap};

use crate::domain::entities::{MessagePermission, PermissionKey};
use crate::domain::errors::PermissionError;
use crate::ports::outbound::PermissionRepository;

#[derive(Default)]
pub struct InMemoryPermissionRepository {
    rows: RwLock<BTreeMap<PermissionKey, MessagePermission>>,
    fees: RwLock<HashMap<String, i64>>,
}

impl InMemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total permission rows.
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn get(&self, key: &PermissionKey) -> Result<Option<MessagePermission>, PermissionError> {
        Ok(self.rows.read().get(key).cloned())
    }

    async fn insert_if_absent(
        &self,
        row: MessagePermission,
    ) -> Result<MessagePermission, PermissionError> {
        Ok(self.rows.write().entry(row.key()).or_insert(row).clone())
    }

    async fn upsert(
        &self,
        key: PermissionKey,
        recipient_fee: i64,
    ) -> Result<MessagePermission, PermissionError> {
        let mut rows = self.rows.write();
        let row = rows
            .entry(key.clone())
            .and_modify(|row| {
                row.recipient_fee = recipient_fee;
                row.updated_at = Utc::now();
            })
            .or_insert_with(|| MessagePermission::new(key, recipient_fee));
        Ok(row.clone())
    }

    async fn list_for_recipient(
        &self,
        recipient: &IdentityKey,
        message_box: Option<&str>,
    ) -> Result<Vec<MessagePermission>, PermissionError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|row| &row.recipient == recipient)
            .filter(|row| message_box.map_or(true, |b| row.message_box == b))
            .cloned()
            .collect())
    }

    async fn delivery_fee(&self, message_box: &str) -> Result<Option<i64>, PermissionError> {
        Ok(self.fees.read().get(message_box).copied())
    }

    async fn set_delivery_fee(&self, message_box: &str, fee: i64) -> Result<(), PermissionError> {
        self.fees.write().insert(message_box.to_string(), fee);
        Ok(())
    }
}
