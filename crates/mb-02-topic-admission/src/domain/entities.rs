//! # Admission Entities

use serde::{Deserialize, Serialize};

/// Overlay topic this validator admits into.
pub const TOPIC_NAME: &str = "tm_messagebox";

/// Human readable topic description.
pub const TOPIC_DESCRIPTION: &str = "Host advertisements for MessageBox identity routing";

/// One transaction output as seen by admission control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub satoshis: u64,
    pub locking_script: Vec<u8>,
}

/// Decoded ledger transaction. Inputs are irrelevant to admission and are
/// not carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub version: u32,
    pub outputs: Vec<TransactionOutput>,
}

/// Result of one admission call. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionDecision {
    /// Output indexes carrying a valid advertisement, ascending.
    pub admitted_output_indexes: Vec<u32>,
    /// Previously admitted coins, passed through unchanged.
    pub retained_coins: Vec<u32>,
}

/// Topic description returned to the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicMetadata {
    pub name: String,
    pub short_description: String,
}

impl Default for TopicMetadata {
    fn default() -> Self {
        Self {
            name: TOPIC_NAME.to_string(),
            short_description: TOPIC_DESCRIPTION.to_string(),
        }
    }
}

/// Structural bounds on advertisement fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionLimits {
    pub max_host_bytes: usize,
    pub max_nonce_bytes: usize,
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self {
            max_host_bytes: 255,
            max_nonce_bytes: 128,
        }
    }
}
