//! # Shared Types Crate
//!
//! This crate contains the domain entities passed between the relay
//! subsystems and the repository port used by every persistent backend.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Advertisement and message records are
//!   defined once here and reused by the advertisement store, the admission
//!   validator, the host resolver and the node runtime.
//! - **Explicit Dependencies**: No global handles. Every backend is a value
//!   implementing [`KeyValueStore`] that is injected by the caller.

pub mod entities;
pub mod errors;
pub mod storage;

pub use entities::*;
pub use errors::*;
pub use storage::{BatchOperation, InMemoryKVStore, KeyValueStore};
