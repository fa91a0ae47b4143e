#![deny(missing_docs)]
#![deny(unreachable_pub)]

//! A Rust implementation of a binary placement network: spillover placement
//! of new participants and roll-up aggregation of subtrees.

/// Participant.
pub mod participant;

/// Participant stores.
pub mod store;

/// Identity resolution.
pub mod identity;

/// Placement resolver.
pub mod placement;

/// Hierarchy aggregation.
pub mod aggregate;

/// Actions.
pub mod action;

/// Network config.
pub mod config;

/// Error type.
pub mod error;

/// Utils for testing.
#[cfg(any(test, feature = "test"))]
pub mod test;

pub use action::{
    register::{Registration, RegistrationReport},
    NetworkAction,
};
pub use aggregate::{build_subtree, Aggregator, Stats, SubtreeReport, TreeSnapshot};
pub use config::NetworkConfig;
pub use error::Error;
pub use identity::{IdentityResolver, LookupStrategy, Reference};
pub use participant::{NewParticipant, Participant, ParticipantId, Position};
pub use placement::{Placement, PlacementResolver, DEFAULT_MAX_DEPTH};
pub use store::{
    memory::{MemoryStore, SharedStore},
    ParticipantStore, ParticipantStoreExt, ParticipantStoreMut, ParticipantStoreMutExt,
};

/// Alias for result.
pub type Result<T> = std::result::Result<T, Error>;
