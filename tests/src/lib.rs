//! # MessageBox Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # criterion benchmarks
//! └── src/integration/  # flows that cross subsystem boundaries
//!     ├── support.rs    # node fixtures and the HTTP bridge
//!     ├── discovery.rs  # advertise, admit, ingest, resolve
//!     ├── permissions.rs# fee gating in front of delivery
//!     └── forwarding.rs # two relays talking over HTTP
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mb-tests
//! cargo test -p mb-tests integration::forwarding::
//! cargo bench -p mb-tests
//! ```

pub mod integration;
