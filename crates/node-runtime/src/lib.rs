//! # MessageBox Node Runtime
//!
//! Wires the relay subsystems into one process.
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and subsystem construction
//! - `adapters/` - storage backends owned by the runtime
//! - `node` - [`MessageBoxNode`], the facade the route layer calls
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file named by `MB_CONFIG`, then `MB_*` overrides)
//! 2. Validate it
//! 3. Build the subsystem container
//! 4. Sign this relay's host advertisement for broadcast

pub mod adapters;
pub mod container;
pub mod node;

pub use container::{ConfigError, ContainerError, NodeConfig, StorageBackend, SubsystemContainer};
pub use node::{MessageBoxNode, NodeError, SendResult, SubmissionReceipt};
