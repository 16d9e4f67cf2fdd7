//! # Resolver Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{IdentityKey, Message, MessageId};

/// Outcome of an overlay lookup.
///
/// `NotResolvable` is a miss, not a failure: the caller falls back to local
/// handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved { host: String, value: T },
    NotResolvable,
}

impl<T> Resolution<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }

    /// Host the operation was carried out on.
    pub fn host(&self) -> Option<&str> {
        match self {
            Resolution::Resolved { host, .. } => Some(host),
            Resolution::NotResolvable => None,
        }
    }
}

/// A message as submitted for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub recipient: IdentityKey,
    pub message_box: String,
    pub message_id: MessageId,
    pub body: String,
}

impl OutboundMessage {
    /// Materialize for local storage.
    pub fn into_message(self, sender: IdentityKey) -> Message {
        Message::new(
            self.message_id,
            self.message_box,
            self.body,
            sender,
            self.recipient,
        )
    }
}

/// A message as returned by list operations, local or remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedMessage {
    pub message_id: MessageId,
    pub body: String,
    pub sender: IdentityKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Message> for ListedMessage {
    fn from(m: Message) -> Self {
        Self {
            message_id: m.message_id,
            body: m.body,
            sender: m.sender,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Result of an idempotent local insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A message with the same id already exists; nothing was written.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    DeliveredLocally,
    Forwarded { host: String },
    /// Neither a local box nor a remote host; the box was created here.
    StoredLocallyAsFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    Local(Vec<ListedMessage>),
    Remote {
        host: String,
        messages: Vec<ListedMessage>,
    },
    Empty,
}

impl ListOutcome {
    pub fn messages(&self) -> &[ListedMessage] {
        match self {
            ListOutcome::Local(messages) | ListOutcome::Remote { messages, .. } => messages,
            ListOutcome::Empty => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    Local { count: usize },
    Remote { host: String },
    NotFound,
}
