//! # Forwarding Wire Protocol
//!
//! Host-to-host request and response bodies. Each host exposes the same
//! shapes on its public API.
//!
//! | Route | Body | `Authorization` |
//! |-------|------|-----------------|
//! | `POST {host}/sendMessage` | `{message: {recipient, messageBox, messageId, body}, sender}` | sender key |
//! | `POST {host}/listMessages` | `{messageBox}` | owner key |
//! | `POST {host}/acknowledgeMessage` | `{messageIds: [..]}` | owner key |

use serde::{Deserialize, Serialize};
use shared_types::IdentityKey;

use super::entities::{ListedMessage, OutboundMessage};

pub const SEND_MESSAGE_PATH: &str = "sendMessage";
pub const LIST_MESSAGES_PATH: &str = "listMessages";
pub const ACKNOWLEDGE_MESSAGE_PATH: &str = "acknowledgeMessage";

/// Value of `status` in every successful response.
pub const SUCCESS_STATUS: &str = "success";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: OutboundMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<IdentityKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesRequest {
    pub message_box: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeRequest {
    pub message_ids: Vec<String>,
}

/// Common response envelope. `messages` is only present on list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ListedMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: SUCCESS_STATUS.to_string(),
            messages: None,
            description: None,
        }
    }

    pub fn with_messages(messages: Vec<ListedMessage>) -> Self {
        Self {
            messages: Some(messages),
            ..Self::success()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }
}
