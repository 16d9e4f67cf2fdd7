//! # Permission Gating Flow
//!
//! Every send is quoted first; only an allowed quote reaches the router.

use mb_03_host_resolver::{ListOutcome, SendOutcome};
use mb_04_permissions::BLOCKED_FEE;
use node_runtime::SendResult;
use shared_types::IdentityKey;

use super::support::{message, node_for};

#[tokio::test]
async fn test_first_contact_provisions_smart_defaults() {
    let relay = node_for("https://relay.example.com");
    let recipient = IdentityKey::new("R");
    let sender = IdentityKey::new("S");

    let notifications = relay.quote(&recipient, &sender, "notifications", 0).await;
    let inbox = relay.quote(&recipient, &sender, "inbox", 0).await;

    assert_eq!(notifications.recipient_fee, 10);
    assert!(!notifications.allowed);
    assert!(notifications.requires_payment);
    assert_eq!(inbox.recipient_fee, 0);
    assert!(inbox.allowed);

    let rows = relay.list_permissions(&recipient, None).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.sender.is_none()));
}

#[tokio::test]
async fn test_sender_override_beats_box_default() {
    let relay = node_for("https://relay.example.com");
    let recipient = IdentityKey::new("R");
    let friend = IdentityKey::new("FRIEND");
    let stranger = IdentityKey::new("STRANGER");

    relay
        .set_permission(&recipient, None, "inbox", BLOCKED_FEE)
        .await
        .unwrap();
    relay
        .set_permission(&recipient, Some(&friend), "inbox", 0)
        .await
        .unwrap();

    let from_stranger = relay
        .send_message(&stranger, message(&recipient, "inbox", "m1", "hi"), 1_000)
        .await
        .unwrap();
    let from_friend = relay
        .send_message(&friend, message(&recipient, "inbox", "m2", "hi"), 0)
        .await
        .unwrap();

    assert!(matches!(from_stranger, SendResult::Denied { .. }));
    assert!(matches!(
        from_friend,
        SendResult::Delivered {
            outcome: SendOutcome::StoredLocallyAsFallback,
            ..
        }
    ));

    let listed = relay.list_messages(&recipient, "inbox").await.unwrap();
    match listed {
        ListOutcome::Local(messages) => {
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].sender, friend);
        }
        other => panic!("expected local messages, got {other:?}"),
    }
}

#[tokio::test]
async fn test_delivery_fee_adds_to_recipient_fee() {
    let relay = node_for("https://relay.example.com");
    let recipient = IdentityKey::new("R");
    let sender = IdentityKey::new("S");

    relay.set_delivery_fee("notifications", 5).await.unwrap();

    let short = relay
        .send_message(&sender, message(&recipient, "notifications", "m1", "ping"), 14)
        .await
        .unwrap();
    let exact = relay
        .send_message(&sender, message(&recipient, "notifications", "m1", "ping"), 15)
        .await
        .unwrap();

    assert_eq!(short.quote().total_cost, 15);
    assert!(matches!(short, SendResult::Denied { .. }));
    assert!(matches!(exact, SendResult::Delivered { .. }));
}

#[tokio::test]
async fn test_batch_quote_denied_by_one_blocked_recipient() {
    let relay = node_for("https://relay.example.com");
    let sender = IdentityKey::new("S");
    let open = IdentityKey::new("OPEN");
    let closed = IdentityKey::new("CLOSED");

    relay
        .set_permission(&closed, Some(&sender), "inbox", BLOCKED_FEE)
        .await
        .unwrap();

    let batch = relay
        .quote_many(&[open.clone(), closed.clone()], &sender, "inbox", 0)
        .await;

    assert!(!batch.allowed);
    assert_eq!(batch.blocked_recipients, vec![closed]);
    assert!(batch.quotes[0].quote.allowed);
}

#[tokio::test]
async fn test_invalid_fees_rejected() {
    let relay = node_for("https://relay.example.com");
    let recipient = IdentityKey::new("R");

    assert!(relay.set_permission(&recipient, None, "inbox", -2).await.is_err());
    assert!(relay.set_delivery_fee("inbox", -1).await.is_err());
    assert!(relay.set_permission(&recipient, None, "", 1).await.is_err());
}
