//! # Two-Relay Forwarding
//!
//! Relay A knows, through the overlay, that Bob is served by relay B. Each
//! relay is a full [`MessageBoxNode`](node_runtime::MessageBoxNode); B is
//! reachable over loopback HTTP.

use std::sync::Arc;

use mb_01_advertisement::Advertiser;
use mb_03_host_resolver::{AckOutcome, ListOutcome, LocalMailbox, SendOutcome};
use mb_04_permissions::BLOCKED_FEE;
use node_runtime::{MessageBoxNode, SendResult};
use shared_crypto::KeyPairSigner;
use shared_types::IdentityKey;

use super::support::{bind_loopback, message, node_for, serve, transaction_with};

struct TwoRelays {
    relay_a: MessageBoxNode,
    relay_b: Arc<MessageBoxNode>,
    host_b: String,
    bob: IdentityKey,
}

/// Relay B serving Bob over HTTP, relay A holding Bob's advertisement.
async fn two_relays() -> TwoRelays {
    let (listener, host_b) = bind_loopback().await;
    let relay_b = Arc::new(node_for(&host_b));
    serve(relay_b.clone(), listener);

    let bob_signer = Arc::new(KeyPairSigner::generate());
    let bob = bob_signer.identity_key();
    let advertisement = Advertiser::new(bob_signer).advertise(&host_b).unwrap();

    let relay_a = node_for("https://relay-a.example.com");
    let receipt = relay_a
        .submit_transaction("tx-bob", transaction_with(&[&advertisement]), Vec::new())
        .await
        .unwrap();
    assert_eq!(receipt.stored.len(), 1);

    TwoRelays {
        relay_a,
        relay_b,
        host_b,
        bob,
    }
}

#[tokio::test]
async fn test_message_forwarded_to_advertised_relay() {
    let t = two_relays().await;
    let alice = IdentityKey::new("ALICE");

    let sent = t
        .relay_a
        .send_message(&alice, message(&t.bob, "inbox", "m1", "hello bob"), 0)
        .await
        .unwrap();

    assert!(matches!(
        sent,
        SendResult::Delivered { outcome: SendOutcome::Forwarded { ref host }, .. } if *host == t.host_b
    ));

    let at_b = t.relay_b.list_messages(&t.bob, "inbox").await.unwrap();
    match at_b {
        ListOutcome::Local(messages) => {
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].body, "hello bob");
            assert_eq!(messages[0].sender, alice);
        }
        other => panic!("expected messages stored on relay B, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_and_acknowledge_through_remote_relay() {
    let t = two_relays().await;
    let alice = IdentityKey::new("ALICE");
    t.relay_a
        .send_message(&alice, message(&t.bob, "inbox", "m1", "hello bob"), 0)
        .await
        .unwrap();

    let listed = t.relay_a.list_messages(&t.bob, "inbox").await.unwrap();
    assert!(matches!(listed, ListOutcome::Remote { ref host, .. } if *host == t.host_b));
    assert_eq!(listed.messages().len(), 1);

    let acked = t
        .relay_a
        .acknowledge(&t.bob, &["m1".to_string()])
        .await
        .unwrap();
    assert_eq!(acked, AckOutcome::Remote { host: t.host_b.clone() });

    let at_b = t.relay_b.list_messages(&t.bob, "inbox").await.unwrap();
    assert!(at_b.messages().is_empty());
}

#[tokio::test]
async fn test_remote_refusal_falls_back_to_local_storage() {
    let t = two_relays().await;
    let alice = IdentityKey::new("ALICE");
    t.relay_b
        .set_permission(&t.bob, Some(&alice), "inbox", BLOCKED_FEE)
        .await
        .unwrap();

    let sent = t
        .relay_a
        .send_message(&alice, message(&t.bob, "inbox", "m1", "hello bob"), 0)
        .await
        .unwrap();

    assert!(matches!(
        sent,
        SendResult::Delivered {
            outcome: SendOutcome::StoredLocallyAsFallback,
            ..
        }
    ));
    let at_a = t.relay_a.list_messages(&t.bob, "inbox").await.unwrap();
    assert!(matches!(at_a, ListOutcome::Local(ref messages) if messages.len() == 1));
}

#[tokio::test]
async fn test_unreachable_relay_falls_back_to_local_storage() {
    let (listener, dead_host) = bind_loopback().await;
    drop(listener);

    let bob_signer = Arc::new(KeyPairSigner::generate());
    let bob = bob_signer.identity_key();
    let advertisement = Advertiser::new(bob_signer).advertise(&dead_host).unwrap();
    let relay_a = node_for("https://relay-a.example.com");
    relay_a
        .submit_transaction("tx-bob", transaction_with(&[&advertisement]), Vec::new())
        .await
        .unwrap();

    let sent = relay_a
        .send_message(&IdentityKey::new("ALICE"), message(&bob, "inbox", "m1", "hi"), 0)
        .await
        .unwrap();

    assert!(matches!(
        sent,
        SendResult::Delivered {
            outcome: SendOutcome::StoredLocallyAsFallback,
            ..
        }
    ));
}

#[tokio::test]
async fn test_relays_with_crossed_views_do_not_bounce_a_message() {
    let (listener_a, host_a) = bind_loopback().await;
    let (listener_b, host_b) = bind_loopback().await;
    let relay_a = Arc::new(node_for(&host_a));
    let relay_b = Arc::new(node_for(&host_b));
    serve(relay_a.clone(), listener_a);
    serve(relay_b.clone(), listener_b);

    // A believes Bob lives on B, B believes Bob lives on A.
    let bob_signer = Arc::new(KeyPairSigner::generate());
    let bob = bob_signer.identity_key();
    let advertiser = Advertiser::new(bob_signer);
    let points_to_b = advertiser.advertise(&host_b).unwrap();
    let points_to_a = advertiser.advertise(&host_a).unwrap();
    relay_a
        .submit_transaction("tx-to-b", transaction_with(&[&points_to_b]), Vec::new())
        .await
        .unwrap();
    relay_b
        .submit_transaction("tx-to-a", transaction_with(&[&points_to_a]), Vec::new())
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let sent = relay_a
        .send_message(&IdentityKey::new("ALICE"), message(&bob, "inbox", "m1", "hi"), 0)
        .await
        .unwrap();

    assert!(started.elapsed() < std::time::Duration::from_secs(1));
    assert!(matches!(
        sent,
        SendResult::Delivered { outcome: SendOutcome::Forwarded { ref host }, .. } if *host == host_b
    ));
    let mailbox_a = &relay_a.container().mailbox;
    let mailbox_b = &relay_b.container().mailbox;
    assert!(!mailbox_a.box_exists(&bob, "inbox").await.unwrap());
    assert_eq!(mailbox_b.list_messages(&bob, "inbox").await.unwrap().len(), 1);
}
