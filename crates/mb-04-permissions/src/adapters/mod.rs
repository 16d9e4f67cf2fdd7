//! # Adapters Layer

mod kv;
mod memory;

pub use kv::KvPermissionRepository;
pub use memory::InMemoryPermissionRepository;
