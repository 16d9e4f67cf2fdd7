//! # Lookup Service
//!
//! Overlay half of delivery: resolve the host currently advertised for an
//! identity, then call that host's equivalent route.

use mb_01_advertisement::AdvertisementStore;
use shared_types::IdentityKey;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::entities::{ListedMessage, OutboundMessage, Resolution};
use crate::domain::errors::{LookupError, RemoteError};
use crate::domain::wire::{AcknowledgeRequest, ListMessagesRequest, SendMessageRequest};
use crate::ports::outbound::RemoteHostClient;

pub struct LookupService {
    advertisements: Arc<dyn AdvertisementStore>,
    client: Arc<dyn RemoteHostClient>,
    /// Our own public host. A resolution pointing here is treated as a miss
    /// so a host never forwards to itself.
    local_host: Option<String>,
}

impl LookupService {
    pub fn new(advertisements: Arc<dyn AdvertisementStore>, client: Arc<dyn RemoteHostClient>) -> Self {
        Self {
            advertisements,
            client,
            local_host: None,
        }
    }

    pub fn with_local_host(mut self, host: impl Into<String>) -> Self {
        self.local_host = Some(normalize(&host.into()).to_string());
        self
    }

    /// Current host for `identity_key`, excluding this host.
    pub async fn resolve_host(&self, identity_key: &IdentityKey) -> Result<Option<String>, LookupError> {
        let host = self
            .advertisements
            .latest_host_for(identity_key)
            .await
            .map_err(|e| LookupError::Repository(e.to_string()))?;

        match host {
            Some(host) if self.local_host.as_deref() == Some(normalize(&host)) => {
                debug!(%identity_key, %host, "identity is advertised on this host");
                Ok(None)
            }
            Some(host) => Ok(Some(host)),
            None => {
                debug!(%identity_key, "no advertisement for identity");
                Ok(None)
            }
        }
    }

    /// Forward a message to the recipient's advertised host.
    pub async fn forward_message(
        &self,
        sender: &IdentityKey,
        message: &OutboundMessage,
    ) -> Result<Resolution<()>, LookupError> {
        let Some(host) = self.resolve_host(&message.recipient).await? else {
            return Ok(Resolution::NotResolvable);
        };
        let request = SendMessageRequest {
            message: message.clone(),
            sender: Some(sender.clone()),
        };
        let result = self.client.send_message(&host, sender, &request).await;
        Ok(settle(host, "sendMessage", result))
    }

    /// List a box on the owner's advertised host.
    pub async fn list_messages(
        &self,
        owner: &IdentityKey,
        message_box: &str,
    ) -> Result<Resolution<Vec<ListedMessage>>, LookupError> {
        let Some(host) = self.resolve_host(owner).await? else {
            return Ok(Resolution::NotResolvable);
        };
        let request = ListMessagesRequest {
            message_box: message_box.to_string(),
        };
        let result = self.client.list_messages(&host, owner, &request).await;
        Ok(settle(host, "listMessages", result))
    }

    /// Acknowledge messages on the owner's advertised host.
    pub async fn acknowledge_messages(
        &self,
        owner: &IdentityKey,
        message_ids: &[String],
    ) -> Result<Resolution<()>, LookupError> {
        let Some(host) = self.resolve_host(owner).await? else {
            return Ok(Resolution::NotResolvable);
        };
        let request = AcknowledgeRequest {
            message_ids: message_ids.to_vec(),
        };
        let result = self.client.acknowledge_messages(&host, owner, &request).await;
        Ok(settle(host, "acknowledgeMessage", result))
    }
}

fn normalize(host: &str) -> &str {
    host.trim_end_matches('/')
}

fn settle<T>(host: String, operation: &str, result: Result<T, RemoteError>) -> Resolution<T> {
    match result {
        Ok(value) => {
            debug!(%host, operation, "remote host accepted");
            Resolution::Resolved { host, value }
        }
        Err(e) => {
            warn!(%host, operation, error = %e, "remote host call failed; falling back");
            Resolution::NotResolvable
        }
    }
}
