//! # Advertisement Errors

use shared_crypto::SigningError;
use shared_types::KVStoreError;
use thiserror::Error;

/// Errors that can occur while creating, decoding or storing advertisements.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdvertisementError {
    /// Tried to persist an advertisement without a confirmed transaction id.
    #[error("Advertisement has no txid; refusing to persist an unconfirmed advertisement")]
    MissingTxid,

    /// A field is absent, empty or structurally invalid.
    #[error("Invalid advertisement field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The locking script does not carry the advertisement token layout.
    #[error("Malformed advertisement script: {0}")]
    MalformedScript(String),

    /// The signing capability could not produce a signature.
    #[error("Signing failed: {0}")]
    Signing(#[from] SigningError),

    /// Backing store failure.
    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<KVStoreError> for AdvertisementError {
    fn from(e: KVStoreError) -> Self {
        AdvertisementError::Repository(e.to_string())
    }
}

impl AdvertisementError {
    pub(crate) fn field(field: &'static str, reason: impl Into<String>) -> Self {
        AdvertisementError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
