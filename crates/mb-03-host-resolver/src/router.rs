//! # Delivery Router
//!
//! Local mailbox first, overlay second, local fallback last.
//!
//! | Operation | Local box | Overlay | Outcome |
//! |-----------|-----------|---------|---------|
//! | send | exists | - | `DeliveredLocally` |
//! | send | missing | resolves | `Forwarded { host }` |
//! | send | missing | miss | `StoredLocallyAsFallback` |
//! | list | exists | - | `Local(..)` |
//! | list | missing | resolves | `Remote { .. }` |
//! | list | missing | miss | `Empty` |
//! | acknowledge | acked >= 1 | - | `Local { count }` |
//! | acknowledge | none acked | resolves | `Remote { host }` |
//! | acknowledge | none acked | miss | `NotFound` |
//!
//! A message another relay forwarded here goes through
//! [`DeliveryRouter::deliver_local`] instead: it lands in a local box and is
//! never forwarded again, so relays with different overlay views cannot
//! bounce it between each other.

use shared_types::IdentityKey;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::entities::{
    AckOutcome, InsertOutcome, ListOutcome, ListedMessage, OutboundMessage, Resolution,
    SendOutcome,
};
use crate::domain::errors::DeliveryError;
use crate::lookup::LookupService;
use crate::ports::outbound::LocalMailbox;

pub struct DeliveryRouter {
    mailbox: Arc<dyn LocalMailbox>,
    lookup: Arc<LookupService>,
}

impl DeliveryRouter {
    pub fn new(mailbox: Arc<dyn LocalMailbox>, lookup: Arc<LookupService>) -> Self {
        Self { mailbox, lookup }
    }

    pub async fn send(
        &self,
        sender: &IdentityKey,
        message: OutboundMessage,
    ) -> Result<SendOutcome, DeliveryError> {
        if self
            .mailbox
            .box_exists(&message.recipient, &message.message_box)
            .await?
        {
            self.store_local(sender, message).await?;
            return Ok(SendOutcome::DeliveredLocally);
        }

        if let Resolution::Resolved { host, .. } =
            self.lookup.forward_message(sender, &message).await?
        {
            info!(
                recipient = %message.recipient,
                message_box = %message.message_box,
                %host,
                "message forwarded"
            );
            return Ok(SendOutcome::Forwarded { host });
        }

        self.mailbox
            .ensure_box(&message.recipient, &message.message_box)
            .await?;
        info!(
            recipient = %message.recipient,
            message_box = %message.message_box,
            "no host for recipient; stored locally"
        );
        self.store_local(sender, message).await?;
        Ok(SendOutcome::StoredLocallyAsFallback)
    }

    /// Store a forwarded message here, creating the box if needed.
    pub async fn deliver_local(
        &self,
        sender: &IdentityKey,
        message: OutboundMessage,
    ) -> Result<SendOutcome, DeliveryError> {
        self.mailbox
            .ensure_box(&message.recipient, &message.message_box)
            .await?;
        debug!(
            recipient = %message.recipient,
            message_box = %message.message_box,
            "forwarded message accepted"
        );
        self.store_local(sender, message).await?;
        Ok(SendOutcome::DeliveredLocally)
    }

    pub async fn list(
        &self,
        owner: &IdentityKey,
        message_box: &str,
    ) -> Result<ListOutcome, DeliveryError> {
        if self.mailbox.box_exists(owner, message_box).await? {
            let messages = self
                .mailbox
                .list_messages(owner, message_box)
                .await?
                .into_iter()
                .map(ListedMessage::from)
                .collect();
            return Ok(ListOutcome::Local(messages));
        }

        match self.lookup.list_messages(owner, message_box).await? {
            Resolution::Resolved { host, value } => Ok(ListOutcome::Remote {
                host,
                messages: value,
            }),
            Resolution::NotResolvable => Ok(ListOutcome::Empty),
        }
    }

    pub async fn acknowledge(
        &self,
        owner: &IdentityKey,
        message_ids: &[String],
    ) -> Result<AckOutcome, DeliveryError> {
        let count = self.mailbox.acknowledge(owner, message_ids).await?;
        if count > 0 {
            debug!(%owner, count, "acknowledged locally");
            return Ok(AckOutcome::Local { count });
        }

        match self.lookup.acknowledge_messages(owner, message_ids).await? {
            Resolution::Resolved { host, .. } => Ok(AckOutcome::Remote { host }),
            Resolution::NotResolvable => Ok(AckOutcome::NotFound),
        }
    }

    async fn store_local(
        &self,
        sender: &IdentityKey,
        message: OutboundMessage,
    ) -> Result<(), DeliveryError> {
        let message = message.into_message(sender.clone());
        if self.mailbox.insert_message(message.clone()).await? == InsertOutcome::Duplicate {
            debug!(message_id = %message.message_id, "duplicate message ignored");
        }
        Ok(())
    }
}
