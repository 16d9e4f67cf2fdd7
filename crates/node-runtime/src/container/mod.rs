//! # Subsystem Container
//!
//! Builds every subsystem from a [`NodeConfig`] and injects the shared
//! storage, signer and HTTP client. Construction order follows the
//! dependency graph: storage, signer, advertisement store, lookup, delivery,
//! permissions.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig, StorageBackend};
pub use subsystems::{ContainerError, SubsystemContainer};
