//! # Topic Admission Subsystem (MB-02)
//!
//! Admission control for the `tm_messagebox` overlay topic. Given an encoded
//! transaction, decides which outputs carry a structurally valid, correctly
//! signed host advertisement.
//!
//! ## Determinism
//!
//! Every overlay node runs this check independently and must reach the same
//! decision on the same transaction. The validator therefore holds no state
//! between calls and performs no I/O besides signature verification.
//!
//! ## Skip, Never Abort
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | Transaction fails to decode | nothing admitted |
//! | Output script not a push-drop token | output skipped |
//! | Field missing or empty | output skipped |
//! | Host without `.` or over 255 bytes | output skipped |
//! | Timestamp not RFC 3339 | output skipped |
//! | Nonce over 128 bytes | output skipped |
//! | Signature invalid | output skipped |
//!
//! Per-output checks run on a bounded rayon pool.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::DefaultTransactionDecoder;
pub use domain::entities::{
    AdmissionDecision, AdmissionLimits, LedgerTransaction, TopicMetadata, TransactionOutput,
    TOPIC_NAME,
};
pub use domain::errors::AdmissionError;
pub use domain::rules::{check_advertisement, evaluate_output, SkipReason};
pub use ports::inbound::TopicManager;
pub use ports::outbound::TransactionDecoder;
pub use service::{AdmissionConfig, TopicAdmissionValidator};
