//! # Topic Admission Benchmarks
//!
//! | Case | What is measured |
//! |------|------------------|
//! | `advertise` | sign one advertisement and encode its script |
//! | `admit_batch/N` | admission of an N-output transaction, half of them forged |
//! | `canonicalize` | canonical signing bytes for one advertisement |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

use mb_01_advertisement::{
    canonicalize, encode_locking_script, AdvertisementDraft, AdvertisementFields, Advertiser,
    SignedAdvertisement,
};
use mb_02_topic_admission::{AdmissionConfig, TopicAdmissionValidator, TopicManager};
use mb_tests::integration::support::transaction_with;
use shared_crypto::KeyPairSigner;

fn batch(advertiser: &Advertiser, size: usize) -> Vec<SignedAdvertisement> {
    (0..size)
        .map(|i| {
            let mut signed = advertiser
                .advertise_draft(
                    &AdvertisementDraft::new(format!("https://h{i}.example.org"))
                        .with_nonce(format!("nonce-{i}")),
                )
                .expect("advertisement signs");
            if i % 2 == 1 {
                signed.advertisement.host = "https://forged.example.org".to_string();
                signed.locking_script =
                    encode_locking_script(&signed.advertisement).expect("script encodes");
            }
            signed
        })
        .collect()
}

fn bench_advertise(c: &mut Criterion) {
    let advertiser = Advertiser::new(Arc::new(KeyPairSigner::generate()));

    let mut group = c.benchmark_group("mb-01-advertisement");
    group.bench_function("advertise", |b| {
        b.iter(|| black_box(advertiser.advertise("https://relay.example.com")))
    });

    let signed = advertiser
        .advertise("https://relay.example.com")
        .expect("advertisement signs");
    let fields = AdvertisementFields::of(&signed.advertisement);
    group.bench_function("canonicalize", |b| b.iter(|| black_box(canonicalize(&fields))));
    group.finish();
}

fn bench_admission(c: &mut Criterion) {
    let advertiser = Advertiser::new(Arc::new(KeyPairSigner::generate()));

    let mut group = c.benchmark_group("mb-02-topic-admission");
    group.measurement_time(Duration::from_secs(10));

    for workers in [1usize, 4] {
        let validator = TopicAdmissionValidator::with_defaults(AdmissionConfig {
            max_workers: workers,
            ..AdmissionConfig::default()
        })
        .expect("validator builds");

        for size in [2usize, 16, 128] {
            let ads = batch(&advertiser, size);
            let refs: Vec<_> = ads.iter().collect();
            let encoded = transaction_with(&refs);

            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("admit_batch/workers={workers}"), size),
                &encoded,
                |b, encoded| b.iter(|| black_box(validator.identify_admissible_outputs(encoded, &[]))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_advertise, bench_admission);
criterion_main!(benches);
