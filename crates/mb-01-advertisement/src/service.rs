//! # Advertisement Services
//!
//! - [`Advertiser`]: signs an advertisement for the local identity and
//!   produces the locking script to broadcast.
//! - [`AdvertisementIngestor`]: persists outputs the topic manager admitted.

use shared_crypto::SigningCapability;
use shared_types::{Advertisement, AdvertisementRecord, StoredAdvertisement};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::codec::{sign, AdvertisementDraft};
use crate::domain::errors::AdvertisementError;
use crate::domain::script::{decode_locking_script, encode_locking_script};
use crate::ports::outbound::AdvertisementStore;

/// A signed advertisement ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAdvertisement {
    pub advertisement: Advertisement,
    pub locking_script: Vec<u8>,
}

/// Anoints a host for the signer's identity.
pub struct Advertiser {
    signer: Arc<dyn SigningCapability>,
}

impl Advertiser {
    pub fn new(signer: Arc<dyn SigningCapability>) -> Self {
        Self { signer }
    }

    /// Sign an advertisement for `host` with a fresh nonce and the current
    /// time, and encode it as an output script.
    pub fn advertise(&self, host: &str) -> Result<SignedAdvertisement, AdvertisementError> {
        self.advertise_draft(&AdvertisementDraft::new(host))
    }

    /// As [`Advertiser::advertise`], with caller-controlled nonce and timestamp.
    pub fn advertise_draft(
        &self,
        draft: &AdvertisementDraft,
    ) -> Result<SignedAdvertisement, AdvertisementError> {
        let advertisement = sign(draft, self.signer.as_ref())?;
        let locking_script = encode_locking_script(&advertisement)?;
        info!(
            identity_key = %advertisement.identity_key,
            host = %advertisement.host,
            "advertisement signed"
        );
        Ok(SignedAdvertisement {
            advertisement,
            locking_script,
        })
    }
}

/// Overlay lookup side: records admitted advertisement outputs.
pub struct AdvertisementIngestor {
    store: Arc<dyn AdvertisementStore>,
}

impl AdvertisementIngestor {
    pub fn new(store: Arc<dyn AdvertisementStore>) -> Self {
        Self { store }
    }

    /// Called once per admitted output.
    ///
    /// Returns `Ok(None)` when the script does not decode to an
    /// advertisement; that output is logged and skipped. Store failures
    /// propagate.
    pub async fn output_admitted(
        &self,
        txid: &str,
        output_index: u32,
        locking_script: &[u8],
    ) -> Result<Option<StoredAdvertisement>, AdvertisementError> {
        let advertisement =
            match decode_locking_script(locking_script).and_then(|d| d.into_advertisement()) {
                Ok(ad) => ad,
                Err(e) => {
                    warn!(txid, output_index, error = %e, "admitted output is not an advertisement");
                    return Ok(None);
                }
            };

        let record = AdvertisementRecord::from_advertisement(&advertisement, txid, output_index);
        let row = self.store.store(record).await?;
        info!(
            identity_key = %row.identity_key,
            host = %row.host,
            txid,
            output_index,
            "advertisement ingested"
        );
        Ok(Some(row))
    }
}
