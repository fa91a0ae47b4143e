use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::{
    action::register::{Register, Registration},
    NetworkConfig, NewParticipant, Participant, ParticipantId, Position,
};

/// In-memory stores.
pub mod memory;

/// Read access to participant records.
pub trait ParticipantStore {
    /// Get the participant with the given id.
    fn participant(&self, id: ParticipantId) -> crate::Result<Option<Participant>>;

    /// Find a participant by exact external code.
    fn find_by_code(&self, code: &str) -> crate::Result<Option<ParticipantId>>;

    /// Find a participant by exact handle.
    fn find_by_handle(&self, handle: &str) -> crate::Result<Option<ParticipantId>>;

    /// Find a participant through a linked authentication identity.
    fn find_by_identity(&self, identity: &str) -> crate::Result<Option<ParticipantId>>;

    /// Get the child occupying `position` under `parent`.
    fn child_at(
        &self,
        parent: ParticipantId,
        position: Position,
    ) -> crate::Result<Option<ParticipantId>>;

    /// Get the direct children of `parent`, in no particular order.
    fn children(&self, parent: ParticipantId) -> crate::Result<Vec<Participant>>;

    /// Get the direct children of all the given parents in one call.
    fn children_of(&self, parents: &[ParticipantId]) -> crate::Result<Vec<Participant>> {
        let mut children = Vec::with_capacity(parents.len().saturating_mul(2));
        for parent in parents {
            children.extend(self.children(*parent)?);
        }
        Ok(children)
    }

    /// Get the number of participants.
    fn len(&self) -> crate::Result<usize>;

    /// Returns whether the store is empty.
    fn is_empty(&self) -> crate::Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Write access to participant records.
pub trait ParticipantStoreMut: ParticipantStore {
    /// Insert a new participant, claiming its slot.
    ///
    /// Checking the slot and inserting must happen as a single atomic step.
    /// The identity carried by `participant`, if any, is linked in the same
    /// step: either both are stored or neither is.
    ///
    /// # Errors
    /// - [`Error::ConflictRetry`](crate::Error::ConflictRetry) if the slot is occupied.
    /// - [`Error::NotFound`](crate::Error::NotFound) if the parent or sponsor does not exist.
    /// - `Duplicate*` errors if a unique key is already taken.
    fn insert(&mut self, participant: NewParticipant) -> crate::Result<ParticipantId>;

    /// Replace the value of the given participant.
    fn set_value(&mut self, id: ParticipantId, value: Option<Decimal>) -> crate::Result<()>;

    /// Link an authentication identity to the given participant.
    fn link_identity(&mut self, identity: &str, id: ParticipantId) -> crate::Result<()>;
}

/// Extension trait for [`ParticipantStore`] with utils.
pub trait ParticipantStoreExt: ParticipantStore {
    /// Get the participant with the given id, or [`Error::NotFound`](crate::Error::NotFound).
    fn get(&self, id: ParticipantId) -> crate::Result<Participant> {
        self.participant(id)?
            .ok_or_else(|| crate::Error::not_found(id))
    }

    /// Returns whether a participant with the given id exists.
    fn contains(&self, id: ParticipantId) -> crate::Result<bool> {
        Ok(self.participant(id)?.is_some())
    }

    /// Get the placement ancestors of `id`, nearest first.
    ///
    /// # Errors
    /// - [`Error::Cycle`](crate::Error::Cycle) if an ancestor is reached twice.
    fn ancestors(&self, id: ParticipantId) -> crate::Result<Vec<ParticipantId>> {
        let mut visited = HashSet::from([id]);
        let mut ancestors = Vec::new();
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent_id() {
            if !visited.insert(parent) {
                return Err(crate::Error::Cycle(parent));
            }
            ancestors.push(parent);
            current = self.get(parent)?;
        }
        Ok(ancestors)
    }

    /// Returns whether `id` is `ancestor` itself or lies in the subtree of `ancestor`.
    fn is_within_subtree(&self, id: ParticipantId, ancestor: ParticipantId) -> crate::Result<bool> {
        if id == ancestor {
            return Ok(true);
        }
        Ok(self.ancestors(id)?.contains(&ancestor))
    }
}

impl<S: ParticipantStore + ?Sized> ParticipantStoreExt for S {}

/// Extension trait for [`ParticipantStoreMut`] with utils.
pub trait ParticipantStoreMutExt: ParticipantStoreMut {
    /// Create a [`Register`] action with the default config.
    fn register(&mut self, registration: Registration) -> crate::Result<Register<'_, Self>> {
        Register::try_new(self, registration, NetworkConfig::default())
    }

    /// Create a [`Register`] action with the given config.
    fn register_with_config(
        &mut self,
        registration: Registration,
        config: NetworkConfig,
    ) -> crate::Result<Register<'_, Self>> {
        Register::try_new(self, registration, config)
    }
}

impl<S: ParticipantStoreMut + ?Sized> ParticipantStoreMutExt for S {}

impl<S: ParticipantStore + ?Sized> ParticipantStore for &S {
    fn participant(&self, id: ParticipantId) -> crate::Result<Option<Participant>> {
        (**self).participant(id)
    }

    fn find_by_code(&self, code: &str) -> crate::Result<Option<ParticipantId>> {
        (**self).find_by_code(code)
    }

    fn find_by_handle(&self, handle: &str) -> crate::Result<Option<ParticipantId>> {
        (**self).find_by_handle(handle)
    }

    fn find_by_identity(&self, identity: &str) -> crate::Result<Option<ParticipantId>> {
        (**self).find_by_identity(identity)
    }

    fn child_at(
        &self,
        parent: ParticipantId,
        position: Position,
    ) -> crate::Result<Option<ParticipantId>> {
        (**self).child_at(parent, position)
    }

    fn children(&self, parent: ParticipantId) -> crate::Result<Vec<Participant>> {
        (**self).children(parent)
    }

    fn children_of(&self, parents: &[ParticipantId]) -> crate::Result<Vec<Participant>> {
        (**self).children_of(parents)
    }

    fn len(&self) -> crate::Result<usize> {
        (**self).len()
    }
}

impl<S: ParticipantStore + ?Sized> ParticipantStore for &mut S {
    fn participant(&self, id: ParticipantId) -> crate::Result<Option<Participant>> {
        (**self).participant(id)
    }

    fn find_by_code(&self, code: &str) -> crate::Result<Option<ParticipantId>> {
        (**self).find_by_code(code)
    }

    fn find_by_handle(&self, handle: &str) -> crate::Result<Option<ParticipantId>> {
        (**self).find_by_handle(handle)
    }

    fn find_by_identity(&self, identity: &str) -> crate::Result<Option<ParticipantId>> {
        (**self).find_by_identity(identity)
    }

    fn child_at(
        &self,
        parent: ParticipantId,
        position: Position,
    ) -> crate::Result<Option<ParticipantId>> {
        (**self).child_at(parent, position)
    }

    fn children(&self, parent: ParticipantId) -> crate::Result<Vec<Participant>> {
        (**self).children(parent)
    }

    fn children_of(&self, parents: &[ParticipantId]) -> crate::Result<Vec<Participant>> {
        (**self).children_of(parents)
    }

    fn len(&self) -> crate::Result<usize> {
        (**self).len()
    }
}

impl<S: ParticipantStoreMut + ?Sized> ParticipantStoreMut for &mut S {
    fn insert(&mut self, participant: NewParticipant) -> crate::Result<ParticipantId> {
        (**self).insert(participant)
    }

    fn set_value(&mut self, id: ParticipantId, value: Option<Decimal>) -> crate::Result<()> {
        (**self).set_value(id, value)
    }

    fn link_identity(&mut self, identity: &str, id: ParticipantId) -> crate::Result<()> {
        (**self).link_identity(identity, id)
    }
}
