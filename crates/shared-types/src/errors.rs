//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors raised by a key-value backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KVStoreError {
    /// Underlying I/O failure (disk, database engine).
    #[error("I/O error: {message}")]
    IOError { message: String },

    /// Stored bytes could not be decoded into the expected record.
    #[error("Corrupted record at key {key}: {message}")]
    Corrupted { key: String, message: String },
}

/// Errors produced while parsing an identity key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityKeyError {
    /// Not valid hexadecimal.
    #[error("Identity key is not valid hex")]
    NotHex,

    /// Wrong length for a compressed secp256k1 point.
    #[error("Identity key must be 33 bytes, got {0}")]
    InvalidLength(usize),

    /// Compressed points start with 0x02 or 0x03.
    #[error("Identity key has invalid prefix 0x{0:02x}")]
    InvalidPrefix(u8),
}
