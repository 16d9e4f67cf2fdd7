//! # Permission Engine Subsystem (MB-04)
//!
//! Decides what a sender must pay, if anything, to deliver into a
//! recipient's message box.
//!
//! ## Fee Convention
//!
//! | `recipient_fee` | Meaning |
//! |-----------------|---------|
//! | `-1` | sender blocked |
//! | `0` | always allowed, free |
//! | `> 0` | satoshis required |
//!
//! The server's own per-box delivery fee is added on top.
//!
//! ## Lookup Order
//!
//! 1. Sender-specific row `(recipient, sender, box)`
//! 2. Box-wide default `(recipient, null, box)`
//! 3. Smart default, persisted as the box-wide default with an atomic
//!    insert-if-absent so concurrent first lookups agree
//!
//! Quotes fail closed: a repository error denies delivery.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryPermissionRepository, KvPermissionRepository};
pub use domain::entities::{
    BatchQuote, FeeQuote, MessagePermission, PermissionKey, RecipientQuote, ServerFee,
    SmartDefaults, BLOCKED_FEE, NOTIFICATIONS_BOX,
};
pub use domain::errors::PermissionError;
pub use ports::outbound::PermissionRepository;
pub use service::PermissionEngine;
