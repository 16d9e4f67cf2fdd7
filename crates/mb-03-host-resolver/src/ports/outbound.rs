//! # Outbound Ports (Driven Ports)

use async_trait::async_trait;
use shared_types::{IdentityKey, Message};

use crate::domain::entities::{InsertOutcome, ListedMessage};
use crate::domain::errors::{MailboxError, RemoteError};
use crate::domain::wire::{AcknowledgeRequest, ListMessagesRequest, SendMessageRequest};

/// HTTP surface of another relay host.
///
/// `authorization` is the acting identity key, sent verbatim in the
/// `Authorization` header. Implementations must not retry.
///
/// Production: `HttpHostClient`
#[async_trait]
pub trait RemoteHostClient: Send + Sync {
    async fn send_message(
        &self,
        host: &str,
        authorization: &IdentityKey,
        request: &SendMessageRequest,
    ) -> Result<(), RemoteError>;

    async fn list_messages(
        &self,
        host: &str,
        authorization: &IdentityKey,
        request: &ListMessagesRequest,
    ) -> Result<Vec<ListedMessage>, RemoteError>;

    async fn acknowledge_messages(
        &self,
        host: &str,
        authorization: &IdentityKey,
        request: &AcknowledgeRequest,
    ) -> Result<(), RemoteError>;
}

/// Message storage on this host.
///
/// Testing and single-process: `InMemoryMailbox`
#[async_trait]
pub trait LocalMailbox: Send + Sync {
    async fn box_exists(
        &self,
        recipient: &IdentityKey,
        message_box: &str,
    ) -> Result<bool, MailboxError>;

    /// Create the box if it does not exist yet.
    async fn ensure_box(&self, recipient: &IdentityKey, message_box: &str)
        -> Result<(), MailboxError>;

    /// Insert into an existing box. Idempotent on `message_id`: a second
    /// insert of the same id is [`InsertOutcome::Duplicate`], not an error.
    async fn insert_message(&self, message: Message) -> Result<InsertOutcome, MailboxError>;

    /// Messages in a box, oldest first. Empty when the box does not exist.
    async fn list_messages(
        &self,
        recipient: &IdentityKey,
        message_box: &str,
    ) -> Result<Vec<Message>, MailboxError>;

    /// Remove the given messages owned by `recipient`. Returns how many were
    /// removed; ids not found are ignored.
    async fn acknowledge(
        &self,
        recipient: &IdentityKey,
        message_ids: &[String],
    ) -> Result<usize, MailboxError>;
}
