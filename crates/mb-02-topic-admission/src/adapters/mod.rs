//! # Adapters Layer

mod decoder;

pub use decoder::DefaultTransactionDecoder;
