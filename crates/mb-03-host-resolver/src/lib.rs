//! # Host Resolver Subsystem (MB-03)
//!
//! Resolves which host currently serves an identity and carries message
//! operations across hosts.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): resolution results, wire shapes, outcomes
//! - **Ports Layer** (`ports/`): `RemoteHostClient` and `LocalMailbox`
//! - **Adapters Layer** (`adapters/`): reqwest client, in-memory mailbox
//! - **Service Layer**: `LookupService` (overlay half) and `DeliveryRouter`
//!   (local first, overlay second, local fallback last)
//!
//! ## Failure Policy
//!
//! A missing advertisement, a non-2xx response, a non-`success` status body,
//! a timeout or a network error all resolve to
//! [`Resolution::NotResolvable`]. Only advertisement store failures surface
//! as errors. No retries happen here.

pub mod adapters;
pub mod domain;
pub mod lookup;
pub mod ports;
pub mod router;

pub use adapters::{HttpHostClient, InMemoryMailbox, DEFAULT_FORWARD_TIMEOUT};
pub use domain::entities::{
    AckOutcome, InsertOutcome, ListOutcome, ListedMessage, OutboundMessage, Resolution,
    SendOutcome,
};
pub use domain::errors::{DeliveryError, LookupError, MailboxError, RemoteError};
pub use domain::wire::{
    AcknowledgeRequest, ListMessagesRequest, SendMessageRequest, StatusResponse, SUCCESS_STATUS,
};
pub use lookup::LookupService;
pub use ports::outbound::{LocalMailbox, RemoteHostClient};
pub use router::DeliveryRouter;
