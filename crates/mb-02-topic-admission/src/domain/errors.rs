//! # Admission Errors
//!
//! Rejected outputs are not errors. These cover the validator's own setup
//! and the decoder port.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// The transaction bytes could not be decoded.
    #[error("Transaction decode failed: {0}")]
    Decode(String),

    /// The worker pool could not be built.
    #[error("Worker pool unavailable: {0}")]
    WorkerPool(String),

    /// Rejected configuration value.
    #[error("Invalid admission config: {0}")]
    InvalidConfig(String),
}
