//! # Permission Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::IdentityKey;

/// Recipient fee meaning "this sender is blocked".
pub const BLOCKED_FEE: i64 = -1;

/// The premium box type with a non-zero smart default.
pub const NOTIFICATIONS_BOX: &str = "notifications";

/// Unique key of a permission row. `sender = None` is the box-wide default.
///
/// Ordering is recipient, then box, then sender with the default first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PermissionKey {
    pub recipient: IdentityKey,
    pub message_box: String,
    pub sender: Option<IdentityKey>,
}

impl PermissionKey {
    pub fn new(
        recipient: &IdentityKey,
        sender: Option<&IdentityKey>,
        message_box: &str,
    ) -> Self {
        Self {
            recipient: recipient.clone(),
            message_box: message_box.to_string(),
            sender: sender.cloned(),
        }
    }

    /// The box-wide default key for the same recipient and box.
    pub fn box_default(&self) -> Self {
        Self {
            sender: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePermission {
    pub recipient: IdentityKey,
    pub sender: Option<IdentityKey>,
    pub message_box: String,
    pub recipient_fee: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessagePermission {
    /// A fresh row stamped now.
    pub fn new(key: PermissionKey, recipient_fee: i64) -> Self {
        let now = Utc::now();
        Self {
            recipient: key.recipient,
            sender: key.sender,
            message_box: key.message_box,
            recipient_fee,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> PermissionKey {
        PermissionKey {
            recipient: self.recipient.clone(),
            message_box: self.message_box.clone(),
            sender: self.sender.clone(),
        }
    }

    pub fn is_box_default(&self) -> bool {
        self.sender.is_none()
    }
}

/// The server's flat relay charge for a box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerFee {
    pub message_box: String,
    pub delivery_fee: i64,
}

/// Fees provisioned the first time a box is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartDefaults {
    pub notifications_fee: i64,
    pub standard_fee: i64,
}

impl Default for SmartDefaults {
    fn default() -> Self {
        Self {
            notifications_fee: 10,
            standard_fee: 0,
        }
    }
}

/// What a sender has to pay to deliver one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub delivery_fee: i64,
    pub recipient_fee: i64,
    pub total_cost: i64,
    pub allowed: bool,
    pub requires_payment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientQuote {
    pub recipient: IdentityKey,
    pub quote: FeeQuote,
}

/// Quote for one message sent to several recipients. The offered payment
/// covers the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuote {
    pub quotes: Vec<RecipientQuote>,
    pub total_cost: i64,
    pub allowed: bool,
    pub blocked_recipients: Vec<IdentityKey>,
}
