//! # MessageBox Node
//!
//! [`MessageBoxNode`] is the surface the route layer calls. It composes the
//! subsystems held by the [`SubsystemContainer`]:
//!
//! ```text
//! submit_transaction ─→ TopicAdmissionValidator ─→ AdvertisementIngestor ─→ store
//! send_message ───────→ PermissionEngine::quote ─→ DeliveryRouter
//! receive_forwarded ──→ PermissionEngine::quote ─→ DeliveryRouter::deliver_local
//! list / acknowledge ─→ DeliveryRouter
//! ```

use std::sync::Arc;

use shared_types::{IdentityKey, StoredAdvertisement};
use thiserror::Error;
use tracing::{info, warn};

use mb_01_advertisement::{AdvertisementError, AdvertisementStore, SignedAdvertisement};
use mb_02_topic_admission::{AdmissionDecision, AdmissionError, TopicManager, TransactionDecoder};
use mb_03_host_resolver::{
    AckOutcome, DeliveryError, ListOutcome, LookupError, OutboundMessage, SendOutcome,
};
use mb_04_permissions::{BatchQuote, FeeQuote, MessagePermission, PermissionError};

use crate::container::{ContainerError, NodeConfig, SubsystemContainer};

/// Errors surfaced to callers of the node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Advertisement(#[from] AdvertisementError),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("Admission worker failed: {0}")]
    Worker(String),
}

/// Result of submitting a transaction to the advertisement topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub decision: AdmissionDecision,
    /// Rows written for the admitted outputs, in output order.
    pub stored: Vec<StoredAdvertisement>,
}

/// Result of a permission-gated send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendResult {
    Delivered { outcome: SendOutcome, quote: FeeQuote },
    /// Nothing was stored or forwarded.
    Denied { quote: FeeQuote },
}

impl SendResult {
    pub fn quote(&self) -> &FeeQuote {
        match self {
            SendResult::Delivered { quote, .. } | SendResult::Denied { quote } => quote,
        }
    }
}

pub struct MessageBoxNode {
    container: SubsystemContainer,
}

impl MessageBoxNode {
    pub fn new(config: NodeConfig) -> Result<Self, ContainerError> {
        Ok(Self::from_container(SubsystemContainer::new(config)?))
    }

    pub fn from_container(container: SubsystemContainer) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &SubsystemContainer {
        &self.container
    }

    pub fn identity_key(&self) -> &IdentityKey {
        &self.container.identity_key
    }

    // =========================================================================
    // DISCOVERY
    // =========================================================================

    /// Sign an advertisement binding this relay's identity to its public host.
    pub fn advertise(&self) -> Result<SignedAdvertisement, NodeError> {
        Ok(self
            .container
            .advertiser
            .advertise(&self.container.config.server.host)?)
    }

    /// Run a transaction through topic admission and record every admitted
    /// advertisement.
    ///
    /// An admitted script that does not decode is logged and skipped. A
    /// store failure stops ingestion and propagates; rows written for
    /// earlier outputs stay, and resubmitting the transaction is safe.
    pub async fn submit_transaction(
        &self,
        txid: &str,
        encoded_tx: Vec<u8>,
        previous_coins: Vec<u32>,
    ) -> Result<SubmissionReceipt, NodeError> {
        let validator = Arc::clone(&self.container.validator);
        let (decision, encoded_tx) = tokio::task::spawn_blocking(move || {
            let decision = validator.identify_admissible_outputs(&encoded_tx, &previous_coins);
            (decision, encoded_tx)
        })
        .await
        .map_err(|e| NodeError::Worker(e.to_string()))?;

        let mut stored = Vec::with_capacity(decision.admitted_output_indexes.len());
        if decision.admitted_output_indexes.is_empty() {
            return Ok(SubmissionReceipt { decision, stored });
        }

        let tx = self.container.decoder.decode(&encoded_tx)?;
        for &index in &decision.admitted_output_indexes {
            let Some(output) = tx.outputs.get(index as usize) else {
                warn!(txid, output_index = index, "admitted index out of range");
                continue;
            };
            if let Some(row) = self
                .container
                .ingestor
                .output_admitted(txid, index, &output.locking_script)
                .await?
            {
                stored.push(row);
            }
        }

        info!(txid, admitted = stored.len(), "transaction processed");
        Ok(SubmissionReceipt { decision, stored })
    }

    /// Host currently advertised for `identity_key`, excluding this relay.
    pub async fn resolve_host(&self, identity_key: &IdentityKey) -> Result<Option<String>, NodeError> {
        Ok(self.container.lookup.resolve_host(identity_key).await?)
    }

    /// Most recent advertisements across all identities.
    pub async fn recent_advertisements(
        &self,
        limit: usize,
    ) -> Result<Vec<StoredAdvertisement>, NodeError> {
        Ok(self.container.advertisements.recent(limit).await?)
    }

    // =========================================================================
    // DELIVERY
    // =========================================================================

    /// Quote the delivery, then route it if the quote allows.
    pub async fn send_message(
        &self,
        sender: &IdentityKey,
        message: OutboundMessage,
        payment_offered: u64,
    ) -> Result<SendResult, NodeError> {
        let quote = self.gate(sender, &message, payment_offered).await;
        if !quote.allowed {
            return Ok(SendResult::Denied { quote });
        }

        let outcome = self.container.router.send(sender, message).await?;
        Ok(SendResult::Delivered { outcome, quote })
    }

    /// Accept a message another relay forwarded here.
    ///
    /// Same permission gate as [`MessageBoxNode::send_message`], but the
    /// message is stored locally and never forwarded again.
    pub async fn receive_forwarded(
        &self,
        sender: &IdentityKey,
        message: OutboundMessage,
        payment_offered: u64,
    ) -> Result<SendResult, NodeError> {
        let quote = self.gate(sender, &message, payment_offered).await;
        if !quote.allowed {
            return Ok(SendResult::Denied { quote });
        }

        let outcome = self.container.router.deliver_local(sender, message).await?;
        Ok(SendResult::Delivered { outcome, quote })
    }

    async fn gate(
        &self,
        sender: &IdentityKey,
        message: &OutboundMessage,
        payment_offered: u64,
    ) -> FeeQuote {
        let quote = self
            .container
            .permissions
            .quote(&message.recipient, sender, &message.message_box, payment_offered)
            .await;
        if !quote.allowed {
            info!(
                %sender,
                recipient = %message.recipient,
                message_box = %message.message_box,
                reason = quote.blocked_reason.as_deref().unwrap_or_default(),
                "delivery denied"
            );
        }
        quote
    }

    pub async fn list_messages(
        &self,
        owner: &IdentityKey,
        message_box: &str,
    ) -> Result<ListOutcome, NodeError> {
        Ok(self.container.router.list(owner, message_box).await?)
    }

    pub async fn acknowledge(
        &self,
        owner: &IdentityKey,
        message_ids: &[String],
    ) -> Result<AckOutcome, NodeError> {
        Ok(self.container.router.acknowledge(owner, message_ids).await?)
    }

    // =========================================================================
    // PERMISSIONS
    // =========================================================================

    pub async fn set_permission(
        &self,
        recipient: &IdentityKey,
        sender: Option<&IdentityKey>,
        message_box: &str,
        recipient_fee: i64,
    ) -> Result<MessagePermission, NodeError> {
        Ok(self
            .container
            .permissions
            .set_permission(recipient, sender, message_box, recipient_fee)
            .await?)
    }

    pub async fn list_permissions(
        &self,
        recipient: &IdentityKey,
        message_box: Option<&str>,
    ) -> Result<Vec<MessagePermission>, NodeError> {
        Ok(self
            .container
            .permissions
            .list_permissions(recipient, message_box)
            .await?)
    }

    pub async fn set_delivery_fee(&self, message_box: &str, fee: i64) -> Result<(), NodeError> {
        Ok(self
            .container
            .permissions
            .set_delivery_fee(message_box, fee)
            .await?)
    }

    pub async fn quote(
        &self,
        recipient: &IdentityKey,
        sender: &IdentityKey,
        message_box: &str,
        payment_offered: u64,
    ) -> FeeQuote {
        self.container
            .permissions
            .quote(recipient, sender, message_box, payment_offered)
            .await
    }

    pub async fn quote_many(
        &self,
        recipients: &[IdentityKey],
        sender: &IdentityKey,
        message_box: &str,
        payment_offered: u64,
    ) -> BatchQuote {
        self.container
            .permissions
            .quote_many(recipients, sender, message_box, payment_offered)
            .await
    }
}
