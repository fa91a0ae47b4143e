use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use rust_decimal::Decimal;

use crate::{Error, NewParticipant, Participant, ParticipantId, Position};

use super::{ParticipantStore, ParticipantStoreMut};

type Slots = [Option<ParticipantId>; 2];

/// An indexed in-memory participant store.
///
/// The `(parent, position)` index is the uniqueness constraint backing
/// [`ParticipantStoreMut::insert`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Snapshot", into = "Snapshot"))]
pub struct MemoryStore {
    participants: BTreeMap<ParticipantId, Participant>,
    codes: HashMap<String, ParticipantId>,
    handles: HashMap<String, ParticipantId>,
    identities: BTreeMap<String, ParticipantId>,
    slots: HashMap<ParticipantId, Slots>,
    next_id: u64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all participants ordered by id.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    /// Get all tree roots ordered by id.
    pub fn roots(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values().filter(|p| p.is_root())
    }

    /// Get all identity links.
    pub fn identities(&self) -> impl Iterator<Item = (&str, ParticipantId)> {
        self.identities.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn allocate_id(&mut self) -> crate::Result<ParticipantId> {
        let next = self.next_id.max(1);
        self.next_id = next
            .checked_add(1)
            .ok_or(Error::Computation("participant id overflow"))?;
        Ok(ParticipantId::new(next))
    }

    fn check_unique_keys(&self, code: &str, handle: Option<&str>) -> crate::Result<()> {
        if code.is_empty() {
            return Err(Error::InvalidArgument("empty external code"));
        }
        if self.codes.contains_key(code) {
            return Err(Error::DuplicateCode(code.to_string()));
        }
        if let Some(handle) = handle {
            if handle.is_empty() {
                return Err(Error::InvalidArgument("empty handle"));
            }
            if self.handles.contains_key(handle) {
                return Err(Error::DuplicateHandle(handle.to_string()));
            }
        }
        Ok(())
    }

    fn check_identity(&self, identity: &str) -> crate::Result<()> {
        if identity.is_empty() {
            return Err(Error::InvalidArgument("empty identity"));
        }
        if self.identities.contains_key(identity) {
            return Err(Error::DuplicateIdentity(identity.to_string()));
        }
        Ok(())
    }

    /// Put a participant and its index entries without checking references.
    fn restore(&mut self, participant: Participant) -> crate::Result<()> {
        self.check_unique_keys(participant.external_code(), participant.handle())?;
        if self.participants.contains_key(&participant.id()) {
            return Err(Error::InvalidArgument("duplicate participant id"));
        }
        match (participant.parent_id(), participant.position()) {
            (Some(parent), Some(position)) => {
                let slots = self.slots.entry(parent).or_default();
                if slots[position.index()].is_some() {
                    return Err(Error::ConflictRetry { parent, position });
                }
                slots[position.index()] = Some(participant.id());
            }
            (None, None) => {}
            _ => {
                return Err(Error::InvalidArgument(
                    "parent and position must be both present or both absent",
                ));
            }
        }
        self.codes
            .insert(participant.external_code.clone(), participant.id());
        if let Some(handle) = participant.handle.as_ref() {
            self.handles.insert(handle.clone(), participant.id());
        }
        self.participants.insert(participant.id(), participant);
        Ok(())
    }

    /// Check that every reference resolves, the placement forest is acyclic and
    /// every level is one more than its parent's.
    fn validate(&self) -> crate::Result<()> {
        let mut acyclic = HashSet::<ParticipantId>::new();
        for participant in self.participants.values() {
            if let Some(sponsor) = participant.sponsor_id() {
                if !self.participants.contains_key(&sponsor) {
                    return Err(Error::not_found(sponsor));
                }
            }
            let mut path = vec![participant.id()];
            let mut current = participant;
            while let Some(parent) = current.parent_id() {
                if acyclic.contains(&parent) {
                    break;
                }
                if path.contains(&parent) {
                    return Err(Error::Cycle(parent));
                }
                path.push(parent);
                current = self
                    .participants
                    .get(&parent)
                    .ok_or_else(|| Error::not_found(parent))?;
            }
            acyclic.extend(path);
        }
        for participant in self.participants.values() {
            let expected = match participant.parent_id() {
                Some(parent) => self
                    .participants
                    .get(&parent)
                    .ok_or_else(|| Error::not_found(parent))?
                    .level()
                    .checked_add(1)
                    .ok_or(Error::Computation("level overflow"))?,
                None => 0,
            };
            if participant.level() != expected {
                return Err(Error::InvalidArgument("participant level does not follow parent"));
            }
        }
        for id in self.identities.values() {
            if !self.participants.contains_key(id) {
                return Err(Error::not_found(id));
            }
        }
        Ok(())
    }
}

impl ParticipantStore for MemoryStore {
    fn participant(&self, id: ParticipantId) -> crate::Result<Option<Participant>> {
        Ok(self.participants.get(&id).cloned())
    }

    fn find_by_code(&self, code: &str) -> crate::Result<Option<ParticipantId>> {
        Ok(self.codes.get(code).copied())
    }

    fn find_by_handle(&self, handle: &str) -> crate::Result<Option<ParticipantId>> {
        Ok(self.handles.get(handle).copied())
    }

    fn find_by_identity(&self, identity: &str) -> crate::Result<Option<ParticipantId>> {
        Ok(self.identities.get(identity).copied())
    }

    fn child_at(
        &self,
        parent: ParticipantId,
        position: Position,
    ) -> crate::Result<Option<ParticipantId>> {
        Ok(self
            .slots
            .get(&parent)
            .and_then(|slots| slots[position.index()]))
    }

    fn children(&self, parent: ParticipantId) -> crate::Result<Vec<Participant>> {
        let Some(slots) = self.slots.get(&parent) else {
            return Ok(Vec::new());
        };
        slots
            .iter()
            .flatten()
            .map(|id| {
                self.participants
                    .get(id)
                    .cloned()
                    .ok_or_else(|| Error::store_unavailable(format!("dangling slot entry {id}")))
            })
            .collect()
    }

    fn len(&self) -> crate::Result<usize> {
        Ok(self.participants.len())
    }
}

impl ParticipantStoreMut for MemoryStore {
    fn insert(&mut self, participant: NewParticipant) -> crate::Result<ParticipantId> {
        self.check_unique_keys(participant.external_code(), participant.handle())?;
        if let Some(identity) = participant.identity() {
            self.check_identity(identity)?;
        }
        if let Some(sponsor) = participant.sponsor_id {
            if !self.participants.contains_key(&sponsor) {
                return Err(Error::not_found(sponsor));
            }
        }
        let level = match participant.slot() {
            Some((parent, position)) => {
                let level = self
                    .participants
                    .get(&parent)
                    .ok_or_else(|| Error::not_found(parent))?
                    .level()
                    .checked_add(1)
                    .ok_or(Error::Computation("level overflow"))?;
                if self.child_at(parent, position)?.is_some() {
                    return Err(Error::ConflictRetry { parent, position });
                }
                level
            }
            None => 0,
        };
        let identity = participant.identity.clone();
        let id = self.allocate_id()?;
        let participant = participant.into_participant(id, level);
        tracing::trace!(
            %id,
            code = participant.external_code(),
            slot = ?participant.slot(),
            "inserting participant"
        );
        self.restore(participant)?;
        if let Some(identity) = identity {
            self.identities.insert(identity, id);
        }
        Ok(id)
    }

    fn set_value(&mut self, id: ParticipantId, value: Option<Decimal>) -> crate::Result<()> {
        let participant = self
            .participants
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(id))?;
        participant.value = value;
        Ok(())
    }

    fn link_identity(&mut self, identity: &str, id: ParticipantId) -> crate::Result<()> {
        if identity.is_empty() {
            return Err(Error::InvalidArgument("empty identity"));
        }
        if !self.participants.contains_key(&id) {
            return Err(Error::not_found(id));
        }
        match self.identities.get(identity) {
            Some(linked) if *linked == id => Ok(()),
            Some(_) => Err(Error::DuplicateIdentity(identity.to_string())),
            None => {
                self.identities.insert(identity.to_string(), id);
                Ok(())
            }
        }
    }
}

/// Serialized form of a [`MemoryStore`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Participants.
    pub participants: Vec<Participant>,
    /// Identity links.
    #[cfg_attr(feature = "serde", serde(default))]
    pub identities: BTreeMap<String, ParticipantId>,
}

impl From<MemoryStore> for Snapshot {
    fn from(store: MemoryStore) -> Self {
        Self {
            participants: store.participants.into_values().collect(),
            identities: store.identities,
        }
    }
}

impl TryFrom<Snapshot> for MemoryStore {
    type Error = Error;

    fn try_from(snapshot: Snapshot) -> Result<Self, Self::Error> {
        let mut store = Self::new();
        for participant in snapshot.participants {
            store.next_id = store.next_id.max(participant.id().get().saturating_add(1));
            store.restore(participant)?;
        }
        store.identities = snapshot.identities;
        store.validate()?;
        Ok(store)
    }
}

/// A [`MemoryStore`] shared between threads.
///
/// Every insert runs under the write lock, so claiming a slot is atomic with
/// respect to concurrent registrations.
#[derive(Debug, Clone, Default)]
pub struct SharedStore(Arc<RwLock<MemoryStore>>);

impl SharedStore {
    /// Create from a store.
    pub fn new(store: MemoryStore) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    fn read(&self) -> crate::Result<RwLockReadGuard<'_, MemoryStore>> {
        self.0.read().map_err(Error::store_unavailable)
    }

    fn write(&self) -> crate::Result<RwLockWriteGuard<'_, MemoryStore>> {
        self.0.write().map_err(Error::store_unavailable)
    }

    /// Clone the current state of the store.
    pub fn to_store(&self) -> crate::Result<MemoryStore> {
        Ok(self.read()?.clone())
    }
}

impl From<MemoryStore> for SharedStore {
    fn from(store: MemoryStore) -> Self {
        Self::new(store)
    }
}

impl ParticipantStore for SharedStore {
    fn participant(&self, id: ParticipantId) -> crate::Result<Option<Participant>> {
        self.read()?.participant(id)
    }

    fn find_by_code(&self, code: &str) -> crate::Result<Option<ParticipantId>> {
        self.read()?.find_by_code(code)
    }

    fn find_by_handle(&self, handle: &str) -> crate::Result<Option<ParticipantId>> {
        self.read()?.find_by_handle(handle)
    }

    fn find_by_identity(&self, identity: &str) -> crate::Result<Option<ParticipantId>> {
        self.read()?.find_by_identity(identity)
    }

    fn child_at(
        &self,
        parent: ParticipantId,
        position: Position,
    ) -> crate::Result<Option<ParticipantId>> {
        self.read()?.child_at(parent, position)
    }

    fn children(&self, parent: ParticipantId) -> crate::Result<Vec<Participant>> {
        self.read()?.children(parent)
    }

    fn children_of(&self, parents: &[ParticipantId]) -> crate::Result<Vec<Participant>> {
        self.read()?.children_of(parents)
    }

    fn len(&self) -> crate::Result<usize> {
        self.read()?.len()
    }
}

impl ParticipantStoreMut for SharedStore {
    fn insert(&mut self, participant: NewParticipant) -> crate::Result<ParticipantId> {
        self.write()?.insert(participant)
    }

    fn set_value(&mut self, id: ParticipantId, value: Option<Decimal>) -> crate::Result<()> {
        self.write()?.set_value(id, value)
    }

    fn link_identity(&mut self, identity: &str, id: ParticipantId) -> crate::Result<()> {
        self.write()?.link_identity(identity, id)
    }
}
