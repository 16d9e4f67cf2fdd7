//! # Ports Layer
//!
//! Outbound ports only: this subsystem is driven through its service types.

pub mod outbound;
