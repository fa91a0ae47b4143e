use crate::{ParticipantId, Position};

/// Error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Reference or root does not resolve to a participant.
    #[error("participant not found: {0}")]
    NotFound(String),
    /// Missing or unrecognized side.
    #[error("invalid position: {0:?}")]
    InvalidPosition(String),
    /// Spillover bound exceeded.
    #[error("no free `{position}` slot below participant {parent} within {max_depth} levels")]
    PlacementExhausted {
        /// The participant the search started from.
        parent: ParticipantId,
        /// The requested side.
        position: Position,
        /// The bound that was hit.
        max_depth: usize,
    },
    /// Underlying data access failure.
    #[error("participant store unavailable: {0}")]
    StoreUnavailable(String),
    /// The slot was claimed by a concurrent placement.
    #[error("slot `{position}` of participant {parent} has been claimed")]
    ConflictRetry {
        /// The parent of the slot.
        parent: ParticipantId,
        /// The side of the slot.
        position: Position,
    },
    /// A participant would become its own ancestor, or the store holds a cycle.
    #[error("placement cycle detected at participant {0}")]
    Cycle(ParticipantId),
    /// External code is already taken.
    #[error("external code {0:?} is already registered")]
    DuplicateCode(String),
    /// Handle is already taken.
    #[error("handle {0:?} is already registered")]
    DuplicateHandle(String),
    /// Identity is already linked.
    #[error("identity {0:?} is already linked")]
    DuplicateIdentity(String),
    /// Invalid Argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// Unknown computation error.
    #[error("unknown computation error: {0}")]
    Computation(&'static str),
}

impl Error {
    /// Create a [`Error::NotFound`] for the given reference.
    pub fn not_found(reference: impl ToString) -> Self {
        Self::NotFound(reference.to_string())
    }

    /// Create a [`Error::StoreUnavailable`] from any displayable error.
    pub fn store_unavailable(err: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable(err.to_string())
    }

    /// Returns whether the failed call may be retried by re-running placement.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConflictRetry { .. })
    }

    /// Human-readable validation message for registration failures.
    pub fn validation_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Invalid Sponsor/Parent reference",
            Self::InvalidPosition(_) => "Invalid placement position",
            Self::PlacementExhausted { .. } => "Unable to find placement slot",
            Self::StoreUnavailable(_) => "Participant store unavailable",
            Self::ConflictRetry { .. } => "Placement slot was taken, please retry",
            Self::Cycle(_) => "Participant cannot be placed under its own downline",
            Self::DuplicateCode(_) => "Code is already registered",
            Self::DuplicateHandle(_) => "Username is already registered",
            Self::DuplicateIdentity(_) => "Account is already linked",
            Self::InvalidArgument(_) => "Invalid registration data",
            Self::Computation(_) => "Unable to compute network value",
        }
    }
}
