//! # Outbound Ports (Driven Ports)

use async_trait::async_trait;
use shared_types::IdentityKey;

use crate::domain::entities::{MessagePermission, PermissionKey};
use crate::domain::errors::PermissionError;

/// Storage for permission rows and server fees.
///
/// Production: `KvPermissionRepository` over RocksDB (node-runtime)
/// Testing: `InMemoryPermissionRepository`
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn get(&self, key: &PermissionKey) -> Result<Option<MessagePermission>, PermissionError>;

    /// Atomically insert `row` unless its key is taken. Returns the row that
    /// ends up stored, which is the existing one if another writer won.
    async fn insert_if_absent(
        &self,
        row: MessagePermission,
    ) -> Result<MessagePermission, PermissionError>;

    /// Insert or replace the fee for `key`. Keeps `created_at` of an existing
    /// row and stamps `updated_at`.
    async fn upsert(
        &self,
        key: PermissionKey,
        recipient_fee: i64,
    ) -> Result<MessagePermission, PermissionError>;

    /// Rows for `recipient` ordered by box, then sender with the box-wide
    /// default first. Optionally limited to one box.
    async fn list_for_recipient(
        &self,
        recipient: &IdentityKey,
        message_box: Option<&str>,
    ) -> Result<Vec<MessagePermission>, PermissionError>;

    async fn delivery_fee(&self, message_box: &str) -> Result<Option<i64>, PermissionError>;

    async fn set_delivery_fee(&self, message_box: &str, fee: i64) -> Result<(), PermissionError>;
}
