//! # Resolver Errors

use thiserror::Error;

/// Lookup failures that are not a plain resolution miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The advertisement store could not be read.
    #[error("Advertisement store error: {0}")]
    Repository(String),
}

/// Why a remote host call did not succeed. Never leaves the lookup
/// service; every variant becomes a resolution miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Remote reported status `{0}`")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Local mailbox failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MailboxError {
    #[error("Message box `{message_box}` does not exist for {recipient}")]
    NoSuchBox {
        recipient: String,
        message_box: String,
    },

    #[error("Mailbox storage error: {0}")]
    Storage(String),
}

/// Errors surfaced by the delivery router.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Mailbox(#[from] MailboxError),
}
