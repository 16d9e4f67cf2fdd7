//! # Outbound Ports (Driven Ports)

use crate::domain::entities::LedgerTransaction;
use crate::domain::errors::AdmissionError;

/// Turns an opaque transaction encoding into its ordered outputs.
///
/// Production and tests: `DefaultTransactionDecoder` (bincode)
pub trait TransactionDecoder: Send + Sync {
    fn decode(&self, encoded_tx: &[u8]) -> Result<LedgerTransaction, AdmissionError>;
}
