//! Cross-subsystem integration flows.

pub mod support;

#[cfg(test)]
mod discovery;
#[cfg(test)]
mod forwarding;
#[cfg(test)]
mod permissions;
