//! # Test Fixtures
//!
//! Node builders and a minimal HTTP bridge that exposes a
//! [`MessageBoxNode`] on the host-to-host routes, so two in-process relays
//! can forward to each other through the real [`HttpHostClient`].
//!
//! [`HttpHostClient`]: mb_03_host_resolver::HttpHostClient

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;

use mb_01_advertisement::SignedAdvertisement;
use mb_02_topic_admission::{DefaultTransactionDecoder, LedgerTransaction, TransactionOutput};
use mb_03_host_resolver::{
    AcknowledgeRequest, ListMessagesRequest, OutboundMessage, SendMessageRequest, StatusResponse,
};
use node_runtime::{MessageBoxNode, NodeConfig, SendResult};
use shared_types::IdentityKey;

/// In-memory node serving `host`.
pub fn node_for(host: &str) -> MessageBoxNode {
    let mut config = NodeConfig::default();
    config.server.host = host.to_string();
    config.forwarding.timeout_ms = 2_000;
    MessageBoxNode::new(config).expect("node builds from default config")
}

/// Wrap advertisement scripts in an encoded transaction, one output each.
pub fn transaction_with(ads: &[&SignedAdvertisement]) -> Vec<u8> {
    let tx = LedgerTransaction {
        version: 1,
        outputs: ads
            .iter()
            .map(|signed| TransactionOutput {
                satoshis: 1,
                locking_script: signed.locking_script.clone(),
            })
            .collect(),
    };
    DefaultTransactionDecoder::encode(&tx).expect("transaction encodes")
}

pub fn message(recipient: &IdentityKey, message_box: &str, id: &str, body: &str) -> OutboundMessage {
    OutboundMessage {
        recipient: recipient.clone(),
        message_box: message_box.to_string(),
        message_id: id.to_string(),
        body: body.to_string(),
    }
}

// =============================================================================
// HTTP BRIDGE
// =============================================================================

/// Bind a loopback listener; its address becomes the node's public host.
pub async fn bind_loopback() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("loopback bind");
    let addr: SocketAddr = listener.local_addr().expect("bound address");
    (listener, format!("http://{addr}"))
}

/// Serve `node` on `listener` until the test runtime shuts down.
///
/// `/sendMessage` is the host-to-host route, so it stores locally through
/// [`MessageBoxNode::receive_forwarded`] and never forwards again.
pub fn serve(node: Arc<MessageBoxNode>, listener: TcpListener) {
    let app = Router::new()
        .route("/sendMessage", post(send_message))
        .route("/listMessages", post(list_messages))
        .route("/acknowledgeMessage", post(acknowledge_message))
        .with_state(node);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
}

fn caller(headers: &HeaderMap) -> Option<IdentityKey> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(IdentityKey::new)
}

fn error(description: impl Into<String>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "error".to_string(),
        messages: None,
        description: Some(description.into()),
    })
}

async fn send_message(
    State(node): State<Arc<MessageBoxNode>>,
    headers: HeaderMap,
    Json(request): Json<SendMessageRequest>,
) -> Json<StatusResponse> {
    let Some(sender) = caller(&headers) else {
        return error("missing authorization");
    };
    match node.receive_forwarded(&sender, request.message, 0).await {
        Ok(SendResult::Delivered { .. }) => Json(StatusResponse::success()),
        Ok(SendResult::Denied { quote }) => {
            error(quote.blocked_reason.unwrap_or_else(|| "denied".to_string()))
        }
        Err(e) => error(e.to_string()),
    }
}

async fn list_messages(
    State(node): State<Arc<MessageBoxNode>>,
    headers: HeaderMap,
    Json(request): Json<ListMessagesRequest>,
) -> Json<StatusResponse> {
    let Some(owner) = caller(&headers) else {
        return error("missing authorization");
    };
    match node.list_messages(&owner, &request.message_box).await {
        Ok(outcome) => Json(StatusResponse::with_messages(outcome.messages().to_vec())),
        Err(e) => error(e.to_string()),
    }
}

async fn acknowledge_message(
    State(node): State<Arc<MessageBoxNode>>,
    headers: HeaderMap,
    Json(request): Json<AcknowledgeRequest>,
) -> Json<StatusResponse> {
    let Some(owner) = caller(&headers) else {
        return error("missing authorization");
    };
    match node.acknowledge(&owner, &request.message_ids).await {
        Ok(_) => Json(StatusResponse::success()),
        Err(e) => error(e.to_string()),
    }
}
