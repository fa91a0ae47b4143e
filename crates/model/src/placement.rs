use std::collections::HashSet;

use crate::{
    Error, IdentityResolver, NetworkConfig, ParticipantId, ParticipantStore, ParticipantStoreExt,
    Position, Reference,
};

/// Default bound of the spillover search.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// A free slot found by the [`PlacementResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    requested: ParticipantId,
    parent: ParticipantId,
    position: Position,
    steps: usize,
}

impl Placement {
    /// Get the participant the search started from.
    pub fn requested(&self) -> ParticipantId {
        self.requested
    }

    /// Get the parent to insert under.
    pub fn parent(&self) -> ParticipantId {
        self.parent
    }

    /// Get the side to insert at.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Get the number of spillover steps taken; `0` if the requested slot was free.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Returns whether the placement spilled over below the requested parent.
    pub fn is_spillover(&self) -> bool {
        self.steps != 0
    }
}

/// Finds the insertion point for a new participant.
///
/// The resolver only reads from the store. The returned slot was free when
/// it was observed; claiming it is left to
/// [`ParticipantStoreMut::insert`](crate::ParticipantStoreMut::insert).
#[derive(Debug)]
pub struct PlacementResolver<'a, S: ?Sized> {
    store: &'a S,
    identity: IdentityResolver,
    max_depth: usize,
}

impl<'a, S: ParticipantStore + ?Sized> PlacementResolver<'a, S> {
    /// Create a resolver with the default config.
    pub fn new(store: &'a S) -> Self {
        Self::with_config(store, &NetworkConfig::default())
    }

    /// Create a resolver with the given config.
    pub fn with_config(store: &'a S, config: &NetworkConfig) -> Self {
        Self {
            store,
            identity: config.identity_resolver(),
            max_depth: config.max_depth,
        }
    }

    /// Get the spillover bound.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolve the requested parent reference and find the first free slot on
    /// the `position` side, spilling over downwards if needed.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if the reference does not resolve.
    /// - [`Error::PlacementExhausted`] if no free slot is found within `max_depth` levels.
    pub fn resolve_placement(
        &self,
        reference: &Reference,
        position: Position,
    ) -> crate::Result<Placement> {
        let requested = self.identity.resolve_reference(self.store, reference)?;
        self.find_slot(requested, position, None)
    }

    /// Same as [`resolve_placement`](Self::resolve_placement), for a participant
    /// that already has an id.
    ///
    /// # Errors
    /// - [`Error::Cycle`] if the slot would lie in the subtree of `subject`.
    pub fn resolve_placement_for(
        &self,
        subject: ParticipantId,
        reference: &Reference,
        position: Position,
    ) -> crate::Result<Placement> {
        let requested = self.identity.resolve_reference(self.store, reference)?;
        if self.store.contains(subject)? && self.store.is_within_subtree(requested, subject)? {
            return Err(Error::Cycle(subject));
        }
        self.find_slot(requested, position, Some(subject))
    }

    /// Find the first free slot on the `position` side starting at `requested`.
    pub fn find_slot(
        &self,
        requested: ParticipantId,
        position: Position,
        subject: Option<ParticipantId>,
    ) -> crate::Result<Placement> {
        let mut candidate = requested;
        let mut visited = HashSet::new();
        for steps in 0..self.max_depth {
            if !visited.insert(candidate) || Some(candidate) == subject {
                return Err(Error::Cycle(candidate));
            }
            match self.store.child_at(candidate, position)? {
                None => {
                    tracing::debug!(
                        %requested,
                        parent = %candidate,
                        %position,
                        steps,
                        "found placement"
                    );
                    return Ok(Placement {
                        requested,
                        parent: candidate,
                        position,
                        steps,
                    });
                }
                Some(child) => {
                    tracing::trace!(
                        parent = %candidate,
                        %child,
                        %position,
                        "slot occupied, spilling over"
                    );
                    candidate = child;
                }
            }
        }
        tracing::warn!(%requested, %position, max_depth = self.max_depth, "placement exhausted");
        Err(Error::PlacementExhausted {
            parent: requested,
            position,
            max_depth: self.max_depth,
        })
    }
}
