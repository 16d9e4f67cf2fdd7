//! # Topic Admission Service
//!
//! [`TopicAdmissionValidator`] implements [`TopicManager`] for the
//! advertisement topic.

use rayon::prelude::*;
use shared_crypto::{KeyPairSigner, SigningCapability};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::adapters::DefaultTransactionDecoder;
use crate::domain::entities::{AdmissionDecision, AdmissionLimits, TopicMetadata, TransactionOutput};
use crate::domain::errors::AdmissionError;
use crate::domain::rules::evaluate_output;
use crate::ports::inbound::TopicManager;
use crate::ports::outbound::TransactionDecoder;

/// Below this many outputs the checks run on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 4;

/// Validator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionConfig {
    /// Upper bound on threads checking outputs of one transaction.
    pub max_workers: usize,
    pub limits: AdmissionLimits,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            limits: AdmissionLimits::default(),
        }
    }
}

/// Stateless admission control for advertisement outputs.
pub struct TopicAdmissionValidator {
    decoder: Arc<dyn TransactionDecoder>,
    verifier: Arc<dyn SigningCapability>,
    limits: AdmissionLimits,
    pool: rayon::ThreadPool,
}

impl TopicAdmissionValidator {
    /// Build a validator with its own bounded worker pool.
    pub fn new(
        config: AdmissionConfig,
        decoder: Arc<dyn TransactionDecoder>,
        verifier: Arc<dyn SigningCapability>,
    ) -> Result<Self, AdmissionError> {
        if config.max_workers == 0 {
            return Err(AdmissionError::InvalidConfig(
                "max_workers must be at least 1".into(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_workers)
            .thread_name(|i| format!("mb-admission-{i}"))
            .build()
            .map_err(|e| AdmissionError::WorkerPool(e.to_string()))?;

        info!(max_workers = config.max_workers, "topic admission validator ready");
        Ok(Self {
            decoder,
            verifier,
            limits: config.limits,
            pool,
        })
    }

    /// bincode decoder and the public "anyone" verifier.
    pub fn with_defaults(config: AdmissionConfig) -> Result<Self, AdmissionError> {
        Self::new(
            config,
            Arc::new(DefaultTransactionDecoder),
            Arc::new(KeyPairSigner::anyone()),
        )
    }

    /// Indexes of the outputs that carry a valid advertisement, ascending.
    pub fn admit_outputs(&self, outputs: &[TransactionOutput]) -> Vec<u32> {
        let check = |(index, output): (usize, &TransactionOutput)| -> Option<u32> {
            let index = u32::try_from(index).ok()?;
            match evaluate_output(&output.locking_script, self.verifier.as_ref(), &self.limits) {
                Ok(ad) => {
                    debug!(output_index = index, identity_key = %ad.identity_key, host = %ad.host, "output admitted");
                    Some(index)
                }
                Err(reason) => {
                    debug!(output_index = index, %reason, "output skipped");
                    None
                }
            }
        };

        if outputs.len() < PARALLEL_THRESHOLD {
            outputs.iter().enumerate().filter_map(check).collect()
        } else {
            self.pool
                .install(|| outputs.par_iter().enumerate().filter_map(check).collect())
        }
    }
}

impl TopicManager for TopicAdmissionValidator {
    fn identify_admissible_outputs(
        &self,
        encoded_tx: &[u8],
        previous_coins: &[u32],
    ) -> AdmissionDecision {
        let admitted_output_indexes = match self.decoder.decode(encoded_tx) {
            Ok(tx) => self.admit_outputs(&tx.outputs),
            Err(e) => {
                warn!(error = %e, "transaction rejected by decoder; admitting nothing");
                Vec::new()
            }
        };

        if !admitted_output_indexes.is_empty() {
            info!(admitted = ?admitted_output_indexes, "advertisement outputs admitted");
        }
        AdmissionDecision {
            admitted_output_indexes,
            retained_coins: previous_coins.to_vec(),
        }
    }

    fn metadata(&self) -> TopicMetadata {
        TopicMetadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{LedgerTransaction, TOPIC_NAME};
    use mb_01_advertisement::{encode_locking_script, sign, AdvertisementDraft};
    use proptest::prelude::*;

    fn script_for(host: &str) -> Vec<u8> {
        let ad = sign(
            &AdvertisementDraft::new(host)
                .with_nonce("abc123")
                .with_timestamp("2025-01-01T00:00:00.000Z"),
            &KeyPairSigner::generate(),
        )
        .unwrap();
        encode_locking_script(&ad).unwrap()
    }

    fn output(locking_script: Vec<u8>) -> TransactionOutput {
        TransactionOutput {
            satoshis: 1,
            locking_script,
        }
    }

    fn encoded(outputs: Vec<TransactionOutput>) -> Vec<u8> {
        DefaultTransactionDecoder::encode(&LedgerTransaction {
            version: 1,
            outputs,
        })
        .unwrap()
    }

    fn validator() -> TopicAdmissionValidator {
        TopicAdmissionValidator::with_defaults(AdmissionConfig::default()).unwrap()
    }

    #[test]
    fn test_mixed_batch_admits_only_valid_outputs() {
        let tx = encoded(vec![
            output(script_for("https://a.example.com")),
            output(script_for("localhost")),
            output(vec![0x6a]),
            output(script_for("https://b.example.com")),
            output(Vec::new()),
        ]);

        let decision = validator().identify_admissible_outputs(&tx, &[7, 9]);

        assert_eq!(decision.admitted_output_indexes, vec![0, 3]);
        assert_eq!(decision.retained_coins, vec![7, 9]);
    }

    #[test]
    fn test_admission_is_deterministic() {
        let outputs: Vec<_> = (0..12)
            .map(|i| {
                if i % 3 == 0 {
                    output(script_for("localhost"))
                } else {
                    output(script_for(&format!("https://h{i}.example.com")))
                }
            })
            .collect();
        let tx = encoded(outputs);
        let validator = validator();

        let first = validator.identify_admissible_outputs(&tx, &[]);
        let second = validator.identify_admissible_outputs(&tx, &[]);

        assert_eq!(first, second);
        assert_eq!(first.admitted_output_indexes.len(), 8);
    }

    #[test]
    fn test_undecodable_transaction_admits_nothing() {
        let decision = validator().identify_admissible_outputs(&[0xff, 0x01], &[3]);
        assert!(decision.admitted_output_indexes.is_empty());
        assert_eq!(decision.retained_coins, vec![3]);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = AdmissionConfig {
            max_workers: 0,
            ..AdmissionConfig::default()
        };
        assert!(matches!(
            TopicAdmissionValidator::with_defaults(config),
            Err(AdmissionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_metadata_names_topic() {
        assert_eq!(validator().metadata().name, TOPIC_NAME);
    }

    proptest! {
        #[test]
        fn prop_random_scripts_never_admitted(
            scripts in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..80), 0..8)
        ) {
            let validator = validator();
            let outputs: Vec<_> = scripts.into_iter().map(output).collect();
            prop_assert!(validator.admit_outputs(&outputs).is_empty());
        }
    }
}
