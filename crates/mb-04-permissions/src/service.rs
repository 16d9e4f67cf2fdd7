//! # Permission Engine
//!
//! Resolves recipient and server fees and turns them into delivery quotes.

use shared_types::IdentityKey;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::entities::{
    BatchQuote, FeeQuote, MessagePermission, PermissionKey, RecipientQuote, SmartDefaults,
};
use crate::domain::errors::PermissionError;
use crate::domain::policy::{
    covers, evaluate, fail_closed, smart_default, validate_delivery_fee, validate_recipient_fee,
};
use crate::ports::outbound::PermissionRepository;

pub struct PermissionEngine {
    repository: Arc<dyn PermissionRepository>,
    defaults: SmartDefaults,
}

impl PermissionEngine {
    pub fn new(repository: Arc<dyn PermissionRepository>, defaults: SmartDefaults) -> Self {
        Self {
            repository,
            defaults,
        }
    }

    /// Server relay fee for a box; 0 when unset.
    pub async fn delivery_fee(&self, message_box: &str) -> Result<i64, PermissionError> {
        require_box(message_box)?;
        Ok(self.repository.delivery_fee(message_box).await?.unwrap_or(0))
    }

    pub async fn set_delivery_fee(&self, message_box: &str, fee: i64) -> Result<(), PermissionError> {
        require_box(message_box)?;
        validate_delivery_fee(fee)?;
        self.repository.set_delivery_fee(message_box, fee).await?;
        info!(message_box, fee, "delivery fee set");
        Ok(())
    }

    /// Fee `recipient` charges `sender` for `message_box`.
    ///
    /// Falls back from the sender row to the box-wide default. If neither
    /// exists, the smart default is persisted as the box-wide default and
    /// returned.
    pub async fn recipient_fee(
        &self,
        recipient: &IdentityKey,
        sender: Option<&IdentityKey>,
        message_box: &str,
    ) -> Result<i64, PermissionError> {
        require_box(message_box)?;
        let key = PermissionKey::new(recipient, sender, message_box);

        if key.sender.is_some() {
            if let Some(row) = self.repository.get(&key).await? {
                return Ok(row.recipient_fee);
            }
        }

        let default_key = key.box_default();
        if let Some(row) = self.repository.get(&default_key).await? {
            return Ok(row.recipient_fee);
        }

        let fee = smart_default(message_box, &self.defaults);
        let stored = self
            .repository
            .insert_if_absent(MessagePermission::new(default_key, fee))
            .await?;
        debug!(
            recipient = %recipient,
            message_box,
            fee = stored.recipient_fee,
            "box-wide default provisioned"
        );
        Ok(stored.recipient_fee)
    }

    /// Set the fee for a sender, or the box-wide default when `sender` is
    /// `None`. Last write wins.
    pub async fn set_permission(
        &self,
        recipient: &IdentityKey,
        sender: Option<&IdentityKey>,
        message_box: &str,
        recipient_fee: i64,
    ) -> Result<MessagePermission, PermissionError> {
        require_box(message_box)?;
        validate_recipient_fee(recipient_fee)?;
        let row = self
            .repository
            .upsert(PermissionKey::new(recipient, sender, message_box), recipient_fee)
            .await?;
        info!(
            recipient = %recipient,
            sender = ?sender.map(IdentityKey::as_str),
            message_box,
            recipient_fee,
            "permission set"
        );
        Ok(row)
    }

    pub async fn list_permissions(
        &self,
        recipient: &IdentityKey,
        message_box: Option<&str>,
    ) -> Result<Vec<MessagePermission>, PermissionError> {
        if let Some(message_box) = message_box {
            require_box(message_box)?;
        }
        self.repository.list_for_recipient(recipient, message_box).await
    }

    /// Quote one delivery. Never fails: fee lookup errors deny delivery.
    pub async fn quote(
        &self,
        recipient: &IdentityKey,
        sender: &IdentityKey,
        message_box: &str,
        payment_offered: u64,
    ) -> FeeQuote {
        match self.fees(recipient, sender, message_box).await {
            Ok((delivery, recipient_fee)) => evaluate(delivery, recipient_fee, Some(payment_offered)),
            Err(e) => {
                warn!(recipient = %recipient, message_box, error = %e, "fee lookup failed; denying");
                fail_closed()
            }
        }
    }

    /// Quote one message to several recipients. `payment_offered` must cover
    /// the summed cost, and any blocked recipient denies the whole batch.
    pub async fn quote_many(
        &self,
        recipients: &[IdentityKey],
        sender: &IdentityKey,
        message_box: &str,
        payment_offered: u64,
    ) -> BatchQuote {
        let mut quotes = Vec::with_capacity(recipients.len());
        let mut blocked_recipients = Vec::new();
        let mut total_cost: i64 = 0;

        for recipient in recipients {
            let quote = match self.fees(recipient, sender, message_box).await {
                Ok((delivery, recipient_fee)) => evaluate(delivery, recipient_fee, None),
                Err(e) => {
                    warn!(recipient = %recipient, message_box, error = %e, "fee lookup failed; denying");
                    fail_closed()
                }
            };
            if !quote.allowed {
                blocked_recipients.push(recipient.clone());
            }
            total_cost = total_cost.saturating_add(quote.total_cost);
            quotes.push(RecipientQuote {
                recipient: recipient.clone(),
                quote,
            });
        }

        BatchQuote {
            allowed: blocked_recipients.is_empty() && covers(payment_offered, total_cost),
            quotes,
            total_cost,
            blocked_recipients,
        }
    }

    async fn fees(
        &self,
        recipient: &IdentityKey,
        sender: &IdentityKey,
        message_box: &str,
    ) -> Result<(i64, i64), PermissionError> {
        let delivery = self.delivery_fee(message_box).await?;
        let recipient_fee = self.recipient_fee(recipient, Some(sender), message_box).await?;
        Ok((delivery, recipient_fee))
    }
}

fn require_box(message_box: &str) -> Result<(), PermissionError> {
    if message_box.trim().is_empty() {
        return Err(PermissionError::EmptyMessageBox);
    }
    if message_box.contains('\0') {
        return Err(PermissionError::InvalidMessageBox(message_box.to_string()));
    }
    Ok(())
}
