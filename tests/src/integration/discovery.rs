//! # Discovery Flow
//!
//! ```text
//! Advertiser ─→ locking script ─→ TopicAdmissionValidator ─→ AdvertisementIngestor
//!                                                                 │
//!                              LookupService::resolve_host ←──────┘
//! ```

use std::sync::Arc;

use mb_01_advertisement::{AdvertisementDraft, Advertiser};
use mb_02_topic_admission::TopicManager;
use shared_crypto::KeyPairSigner;

use super::support::{node_for, transaction_with};

#[tokio::test]
async fn test_advertised_identity_resolves_to_its_host() {
    let relay = node_for("https://relay.example.com");
    let bob = Arc::new(KeyPairSigner::generate());
    let signed = Advertiser::new(bob.clone())
        .advertise("https://bob-host.example.org")
        .unwrap();

    let receipt = relay
        .submit_transaction("tx-bob", transaction_with(&[&signed]), Vec::new())
        .await
        .unwrap();

    assert_eq!(receipt.decision.admitted_output_indexes, vec![0]);
    assert_eq!(
        relay.resolve_host(&bob.identity_key()).await.unwrap(),
        Some("https://bob-host.example.org".to_string())
    );
}

#[tokio::test]
async fn test_newer_advertisement_supersedes_older() {
    let relay = node_for("https://relay.example.com");
    let bob = Arc::new(KeyPairSigner::generate());
    let advertiser = Advertiser::new(bob.clone());

    let first = advertiser.advertise("https://first.example.org").unwrap();
    relay
        .submit_transaction("tx-1", transaction_with(&[&first]), Vec::new())
        .await
        .unwrap();
    let second = advertiser.advertise("https://second.example.org").unwrap();
    relay
        .submit_transaction("tx-2", transaction_with(&[&second]), Vec::new())
        .await
        .unwrap();

    assert_eq!(
        relay.resolve_host(&bob.identity_key()).await.unwrap(),
        Some("https://second.example.org".to_string())
    );
    let recent = relay.recent_advertisements(10).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].txid, "tx-2");
}

#[tokio::test]
async fn test_replayed_output_does_not_take_the_host_back() {
    let relay = node_for("https://relay.example.com");
    let bob = Arc::new(KeyPairSigner::generate());
    let advertiser = Advertiser::new(bob.clone());

    let old = advertiser
        .advertise_draft(
            &AdvertisementDraft::new("https://old.example.org")
                .with_timestamp("2025-01-01T00:00:00.000Z"),
        )
        .unwrap();
    let new = advertiser
        .advertise_draft(
            &AdvertisementDraft::new("https://new.example.org")
                .with_timestamp("2025-06-01T00:00:00.000Z"),
        )
        .unwrap();

    for (txid, signed) in [("tx-1", &old), ("tx-2", &new), ("tx-3", &old)] {
        let receipt = relay
            .submit_transaction(txid, transaction_with(&[signed]), Vec::new())
            .await
            .unwrap();
        assert_eq!(receipt.decision.admitted_output_indexes, vec![0]);
    }

    assert_eq!(
        relay.resolve_host(&bob.identity_key()).await.unwrap(),
        Some("https://new.example.org".to_string())
    );
}

#[tokio::test]
async fn test_forged_and_malformed_outputs_are_not_admitted() {
    let relay = node_for("https://relay.example.com");
    let honest = Advertiser::new(Arc::new(KeyPairSigner::generate()))
        .advertise("https://honest.example.org")
        .unwrap();

    // Re-point a signed advertisement at another host without re-signing.
    let mut forged_ad = honest.advertisement.clone();
    forged_ad.host = "https://evil.example.org".to_string();
    let forged = mb_01_advertisement::SignedAdvertisement {
        locking_script: mb_01_advertisement::encode_locking_script(&forged_ad).unwrap(),
        advertisement: forged_ad,
    };
    let no_domain = Advertiser::new(Arc::new(KeyPairSigner::generate()))
        .advertise("http://localhost")
        .unwrap();

    let receipt = relay
        .submit_transaction(
            "tx-mixed",
            transaction_with(&[&forged, &honest, &no_domain]),
            vec![9],
        )
        .await
        .unwrap();

    assert_eq!(receipt.decision.admitted_output_indexes, vec![1]);
    assert_eq!(receipt.decision.retained_coins, vec![9]);
    assert_eq!(receipt.stored.len(), 1);
    assert_eq!(receipt.stored[0].host, "https://honest.example.org");
}

#[test]
fn test_admission_is_deterministic_across_large_batches() {
    let relay = node_for("https://relay.example.com");
    let advertiser = Advertiser::new(Arc::new(KeyPairSigner::generate()));
    let ads: Vec<_> = (0..16)
        .map(|i| {
            let host = if i % 3 == 0 {
                "nodomain".to_string()
            } else {
                format!("https://h{i}.example.org")
            };
            advertiser
                .advertise_draft(&AdvertisementDraft::new(host).with_nonce(format!("n{i}")))
                .unwrap()
        })
        .collect();
    let refs: Vec<_> = ads.iter().collect();
    let encoded = transaction_with(&refs);

    let validator = &relay.container().validator;
    let first = validator.identify_admissible_outputs(&encoded, &[]);
    let second = validator.identify_admissible_outputs(&encoded, &[]);

    let expected: Vec<u32> = (0..16).filter(|i| i % 3 != 0).collect();
    assert_eq!(first.admitted_output_indexes, expected);
    assert_eq!(first, second);
}
