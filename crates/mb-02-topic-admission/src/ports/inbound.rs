//! # Inbound Ports (Driving Ports)
//!
//! The interface the overlay engine calls for every transaction submitted
//! to the topic.

use crate::domain::entities::{AdmissionDecision, TopicMetadata};

/// Topic manager contract.
pub trait TopicManager: Send + Sync {
    /// Decide which outputs of `encoded_tx` to admit. Never fails: a
    /// transaction that does not decode admits nothing.
    fn identify_admissible_outputs(
        &self,
        encoded_tx: &[u8],
        previous_coins: &[u32],
    ) -> AdmissionDecision;

    fn metadata(&self) -> TopicMetadata;
}
