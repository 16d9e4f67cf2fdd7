//! reqwest implementation of [`RemoteHostClient`].

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use shared_types::IdentityKey;
use std::time::Duration;
use tracing::debug;

use crate::domain::entities::ListedMessage;
use crate::domain::errors::RemoteError;
use crate::domain::wire::{
    AcknowledgeRequest, ListMessagesRequest, SendMessageRequest, StatusResponse,
    ACKNOWLEDGE_MESSAGE_PATH, LIST_MESSAGES_PATH, SEND_MESSAGE_PATH,
};
use crate::ports::outbound::RemoteHostClient;

/// Default per-request timeout.
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON over HTTP client for remote relay hosts.
#[derive(Clone)]
pub struct HttpHostClient {
    client: reqwest::Client,
}

impl HttpHostClient {
    /// Client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    async fn post<B: Serialize + Sync>(
        &self,
        host: &str,
        path: &str,
        authorization: &IdentityKey,
        body: &B,
    ) -> Result<StatusResponse, RemoteError> {
        let url = format!("{}/{}", host.trim_end_matches('/'), path);
        debug!(%url, "forwarding to remote host");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, authorization.as_str())
            .json(body)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        if !parsed.is_success() {
            return Err(RemoteError::Rejected(parsed.status));
        }
        Ok(parsed)
    }
}

fn map_transport(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else {
        RemoteError::Transport(e.to_string())
    }
}

#[async_trait]
impl RemoteHostClient for HttpHostClient {
    async fn send_message(
        &self,
        host: &str,
        authorization: &IdentityKey,
        request: &SendMessageRequest,
    ) -> Result<(), RemoteError> {
        self.post(host, SEND_MESSAGE_PATH, authorization, request)
            .await
            .map(|_| ())
    }

    async fn list_messages(
        &self,
        host: &str,
        authorization: &IdentityKey,
        request: &ListMessagesRequest,
    ) -> Result<Vec<ListedMessage>, RemoteError> {
        let response = self
            .post(host, LIST_MESSAGES_PATH, authorization, request)
            .await?;
        Ok(response.messages.unwrap_or_default())
    }

    async fn acknowledge_messages(
        &self,
        host: &str,
        authorization: &IdentityKey,
        request: &AcknowledgeRequest,
    ) -> Result<(), RemoteError> {
        self.post(host, ACKNOWLEDGE_MESSAGE_PATH, authorization, request)
            .await
            .map(|_| ())
    }
}
