//! # Subsystem Container
//!
//! Holds all subsystem instances and the shared infrastructure they were
//! built on.
//!
//! ## Initialization Order
//!
//! ```text
//! Phase 1: Storage backend (memory or RocksDB) and relay identity
//! Phase 2: Advertisement store, advertiser, ingestor
//! Phase 3: Topic admission validator
//! Phase 4: Lookup service over the HTTP host client, delivery router
//! Phase 5: Permission engine
//! ```
//!
//! ## Thread Safety
//!
//! Every subsystem is `Send + Sync` and held behind an `Arc`; none needs an
//! outer lock.

use std::sync::Arc;

use shared_crypto::{KeyPairSigner, SigningCapability};
use shared_types::{IdentityKey, InMemoryKVStore, KVStoreError, KeyValueStore};
use thiserror::Error;
use tracing::{info, instrument, warn};

use mb_01_advertisement::{
    AdvertisementError, AdvertisementIngestor, AdvertisementStore, Advertiser,
    KvAdvertisementStore,
};
use mb_02_topic_admission::{
    AdmissionError, DefaultTransactionDecoder, TopicAdmissionValidator, TransactionDecoder,
};
use mb_03_host_resolver::{
    DeliveryRouter, HttpHostClient, InMemoryMailbox, LocalMailbox, LookupService,
    RemoteHostClient, RemoteError,
};
use mb_04_permissions::{KvPermissionRepository, PermissionEngine};

use crate::container::config::{NodeConfig, StorageBackend};

/// Failures while wiring the node.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Invalid relay identity key: {0}")]
    Identity(String),

    #[error("Storage backend failed to open: {0}")]
    Storage(#[from] KVStoreError),

    #[error("Storage backend `{0:?}` is not compiled into this binary")]
    BackendUnavailable(StorageBackend),

    #[error("Advertisement store: {0}")]
    Advertisement(#[from] AdvertisementError),

    #[error("Topic admission: {0}")]
    Admission(#[from] AdmissionError),

    #[error("HTTP client: {0}")]
    Http(#[from] RemoteError),
}

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    // =========================================================================
    // IDENTITY
    // =========================================================================
    /// Signs this relay's own advertisements.
    pub signer: Arc<dyn SigningCapability>,
    pub identity_key: IdentityKey,

    // =========================================================================
    // DISCOVERY
    // =========================================================================
    pub advertisements: Arc<dyn AdvertisementStore>,
    pub advertiser: Arc<Advertiser>,
    pub ingestor: Arc<AdvertisementIngestor>,
    pub validator: Arc<TopicAdmissionValidator>,
    /// Decoder shared with the validator, used again to pull admitted scripts.
    pub decoder: Arc<dyn TransactionDecoder>,

    // =========================================================================
    // DELIVERY
    // =========================================================================
    pub mailbox: Arc<dyn LocalMailbox>,
    pub lookup: Arc<LookupService>,
    pub router: Arc<DeliveryRouter>,

    // =========================================================================
    // PERMISSIONS
    // =========================================================================
    pub permissions: Arc<PermissionEngine>,

    /// Node configuration (immutable after initialization).
    pub config: NodeConfig,
}

impl SubsystemContainer {
    /// Build every subsystem with the HTTP host client.
    #[instrument(name = "subsystem_init", skip(config))]
    pub fn new(config: NodeConfig) -> Result<Self, ContainerError> {
        let client = Arc::new(HttpHostClient::new(config.forwarding.timeout())?);
        Self::with_remote_client(config, client)
    }

    /// Build every subsystem around a caller-supplied remote host client.
    pub fn with_remote_client(
        config: NodeConfig,
        client: Arc<dyn RemoteHostClient>,
    ) -> Result<Self, ContainerError> {
        info!(host = %config.server.host, backend = ?config.storage.backend, "initializing MessageBox node");

        match config.storage.backend {
            StorageBackend::Memory => {
                Self::assemble(config, client, Arc::new(InMemoryKVStore::new()))
            }
            #[cfg(feature = "rocksdb")]
            StorageBackend::Rocksdb => {
                let path = config.storage.data_dir.join("rocksdb");
                let kv = crate::adapters::storage::RocksDbStore::open_default(&path)?;
                info!(path = %path.display(), "RocksDB opened");
                Self::assemble(config, client, Arc::new(kv))
            }
            #[cfg(not(feature = "rocksdb"))]
            backend @ StorageBackend::Rocksdb => Err(ContainerError::BackendUnavailable(backend)),
        }
    }

    fn assemble<S: KeyValueStore + 'static>(
        config: NodeConfig,
        client: Arc<dyn RemoteHostClient>,
        kv: Arc<S>,
    ) -> Result<Self, ContainerError> {
        // =====================================================================
        // PHASE 1: Identity
        // =====================================================================
        let keypair = Self::init_signer(&config)?;
        let identity_key = keypair.identity_key();
        let signer: Arc<dyn SigningCapability> = Arc::new(keypair);
        info!(%identity_key, "relay identity loaded");

        // =====================================================================
        // PHASE 2: Advertisements
        // =====================================================================
        let advertisements: Arc<dyn AdvertisementStore> =
            Arc::new(KvAdvertisementStore::open(kv.clone())?);
        let advertiser = Arc::new(Advertiser::new(signer.clone()));
        let ingestor = Arc::new(AdvertisementIngestor::new(advertisements.clone()));

        // =====================================================================
        // PHASE 3: Topic admission
        // =====================================================================
        let decoder: Arc<dyn TransactionDecoder> = Arc::new(DefaultTransactionDecoder);
        let validator = Arc::new(TopicAdmissionValidator::new(
            config.admission.to_admission_config(),
            decoder.clone(),
            Arc::new(KeyPairSigner::anyone()),
        )?);

        // =====================================================================
        // PHASE 4: Delivery
        // =====================================================================
        let mailbox: Arc<dyn LocalMailbox> = Arc::new(InMemoryMailbox::new());
        let lookup = Arc::new(
            LookupService::new(advertisements.clone(), client)
                .with_local_host(config.server.host.clone()),
        );
        let router = Arc::new(DeliveryRouter::new(mailbox.clone(), lookup.clone()));

        // =====================================================================
        // PHASE 5: Permissions
        // =====================================================================
        let permissions = Arc::new(PermissionEngine::new(
            Arc::new(KvPermissionRepository::new(kv)),
            config.permissions.smart_defaults(),
        ));

        info!("all subsystems initialized");
        Ok(Self {
            signer,
            identity_key,
            advertisements,
            advertiser,
            ingestor,
            validator,
            decoder,
            mailbox,
            lookup,
            router,
            permissions,
            config,
        })
    }

    fn init_signer(config: &NodeConfig) -> Result<KeyPairSigner, ContainerError> {
        match &config.server.identity_private_key {
            Some(secret) => KeyPairSigner::from_secret_hex(secret)
                .map_err(|e| ContainerError::Identity(e.to_string())),
            None => {
                warn!("no identity key configured; generated an ephemeral identity");
                Ok(KeyPairSigner::generate())
            }
        }
    }
}
