//! # Domain Layer
//!
//! Pure advertisement logic with no I/O dependencies.

pub mod codec;
pub mod errors;
pub mod script;
