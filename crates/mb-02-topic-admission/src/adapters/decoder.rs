//! bincode transaction decoder.

use crate::domain::entities::LedgerTransaction;
use crate::domain::errors::AdmissionError;
use crate::ports::outbound::TransactionDecoder;

/// Decodes a bincode encoded [`LedgerTransaction`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransactionDecoder;

impl DefaultTransactionDecoder {
    /// Encode a transaction the way this decoder reads it.
    pub fn encode(tx: &LedgerTransaction) -> Result<Vec<u8>, AdmissionError> {
        bincode::serialize(tx).map_err(|e| AdmissionError::Decode(e.to_string()))
    }
}

impl TransactionDecoder for DefaultTransactionDecoder {
    fn decode(&self, encoded_tx: &[u8]) -> Result<LedgerTransaction, AdmissionError> {
        bincode::deserialize(encoded_tx).map_err(|e| AdmissionError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::TransactionOutput;

    #[test]
    fn test_decodes_encoded_transaction() {
        let tx = LedgerTransaction {
            version: 1,
            outputs: vec![TransactionOutput {
                satoshis: 1,
                locking_script: vec![0x51],
            }],
        };
        let bytes = DefaultTransactionDecoder::encode(&tx).unwrap();
        assert_eq!(DefaultTransactionDecoder.decode(&bytes).unwrap(), tx);
    }

    #[test]
    fn test_truncated_bytes_fail() {
        assert!(matches!(
            DefaultTransactionDecoder.decode(&[1, 0]),
            Err(AdmissionError::Decode(_))
        ));
    }
}
