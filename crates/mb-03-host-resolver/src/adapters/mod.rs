//! # Adapters Layer

mod http;
mod mailbox;

pub use http::{HttpHostClient, DEFAULT_FORWARD_TIMEOUT};
pub use mailbox::InMemoryMailbox;
