use std::cell::Cell;

use rust_decimal::Decimal;

use crate::{
    Error, MemoryStore, NewParticipant, Participant, ParticipantId, ParticipantStore,
    ParticipantStoreMut, Position,
};

/// Test Network.
///
/// Builds trees by claiming slots directly, bypassing placement.
#[derive(Debug, Default, Clone)]
pub struct TestNetwork {
    store: MemoryStore,
}

impl TestNetwork {
    /// Get the underlying store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Get the underlying store mutably.
    pub fn store_mut(&mut self) -> &mut MemoryStore {
        &mut self.store
    }

    /// Consume into the underlying store.
    pub fn into_store(self) -> MemoryStore {
        self.store
    }

    fn insert(
        &mut self,
        code: &str,
        slot: Option<(ParticipantId, Position)>,
        value: Option<Decimal>,
    ) -> crate::Result<ParticipantId> {
        let mut participant = NewParticipant::builder().external_code(code).build();
        participant.sponsor_id = slot.map(|(parent, _)| parent);
        participant.slot = slot;
        participant.value = value;
        self.store.insert(participant)
    }

    /// Add a root.
    pub fn root(&mut self, code: &str) -> crate::Result<ParticipantId> {
        self.insert(code, None, None)
    }

    /// Add a root with a value.
    pub fn root_with_value(&mut self, code: &str, value: Decimal) -> crate::Result<ParticipantId> {
        self.insert(code, None, Some(value))
    }

    /// Add a child at the given slot, sponsored by its parent.
    pub fn child(
        &mut self,
        code: &str,
        parent: ParticipantId,
        position: Position,
    ) -> crate::Result<ParticipantId> {
        self.insert(code, Some((parent, position)), None)
    }

    /// Add a child with a value.
    pub fn child_with_value(
        &mut self,
        code: &str,
        parent: ParticipantId,
        position: Position,
        value: Decimal,
    ) -> crate::Result<ParticipantId> {
        self.insert(code, Some((parent, position)), Some(value))
    }

    /// Add a column of `len` participants below `start`, all on the `position` side.
    ///
    /// `start` must have a free slot on that side.
    pub fn chain(
        &mut self,
        start: ParticipantId,
        position: Position,
        len: usize,
    ) -> crate::Result<Vec<ParticipantId>> {
        let mut ids = Vec::with_capacity(len);
        let mut parent = start;
        for _ in 0..len {
            let code = format!("auto-{}", self.store.len()?);
            parent = self.child(&code, parent, position)?;
            ids.push(parent);
        }
        Ok(ids)
    }
}

/// A store that fails once a number of calls has been served.
#[derive(Debug)]
pub struct FailingStore<S> {
    inner: S,
    remaining: Cell<usize>,
}

impl<S> FailingStore<S> {
    /// Wrap `inner`, allowing `allowed_calls` calls to succeed.
    pub fn new(inner: S, allowed_calls: usize) -> Self {
        Self {
            inner,
            remaining: Cell::new(allowed_calls),
        }
    }

    fn call(&self) -> crate::Result<()> {
        match self.remaining.get() {
            0 => Err(Error::store_unavailable("injected failure")),
            n => {
                self.remaining.set(n - 1);
                Ok(())
            }
        }
    }
}

impl<S: ParticipantStore> ParticipantStore for FailingStore<S> {
    fn participant(&self, id: ParticipantId) -> crate::Result<Option<Participant>> {
        self.call()?;
        self.inner.participant(id)
    }

    fn find_by_code(&self, code: &str) -> crate::Result<Option<ParticipantId>> {
        self.call()?;
        self.inner.find_by_code(code)
    }

    fn find_by_handle(&self, handle: &str) -> crate::Result<Option<ParticipantId>> {
        self.call()?;
        self.inner.find_by_handle(handle)
    }

    fn find_by_identity(&self, identity: &str) -> crate::Result<Option<ParticipantId>> {
        self.call()?;
        self.inner.find_by_identity(identity)
    }

    fn child_at(
        &self,
        parent: ParticipantId,
        position: Position,
    ) -> crate::Result<Option<ParticipantId>> {
        self.call()?;
        self.inner.child_at(parent, position)
    }

    fn children(&self, parent: ParticipantId) -> crate::Result<Vec<Participant>> {
        self.call()?;
        self.inner.children(parent)
    }

    fn children_of(&self, parents: &[ParticipantId]) -> crate::Result<Vec<Participant>> {
        self.call()?;
        self.inner.children_of(parents)
    }

    fn len(&self) -> crate::Result<usize> {
        self.call()?;
        self.inner.len()
    }
}

/// A corrupt store whose placement links loop back to an ancestor.
///
/// `A` (`#1`) and `B` (`#2`) are each other's child on either side.
#[derive(Debug, Clone)]
pub struct CyclicStore {
    a: Participant,
    b: Participant,
}

impl Default for CyclicStore {
    fn default() -> Self {
        let a_id = ParticipantId::new(1);
        let b_id = ParticipantId::new(2);
        let mut a = NewParticipant::builder()
            .external_code("A")
            .build()
            .into_participant(a_id, 0);
        a.parent_id = Some(b_id);
        a.position = Some(Position::Left);
        let b = NewParticipant::builder()
            .external_code("B")
            .slot((a_id, Position::Left))
            .build()
            .into_participant(b_id, 1);
        Self { a, b }
    }
}

impl CyclicStore {
    /// Get the id of `A`.
    pub fn a(&self) -> ParticipantId {
        self.a.id()
    }

    /// Get the id of `B`.
    pub fn b(&self) -> ParticipantId {
        self.b.id()
    }

    fn other(&self, id: ParticipantId) -> Option<&Participant> {
        if id == self.a.id() {
            Some(&self.b)
        } else if id == self.b.id() {
            Some(&self.a)
        } else {
            None
        }
    }
}

impl ParticipantStore for CyclicStore {
    fn participant(&self, id: ParticipantId) -> crate::Result<Option<Participant>> {
        Ok([&self.a, &self.b]
            .into_iter()
            .find(|p| p.id() == id)
            .cloned())
    }

    fn find_by_code(&self, code: &str) -> crate::Result<Option<ParticipantId>> {
        Ok([&self.a, &self.b]
            .into_iter()
            .find(|p| p.external_code() == code)
            .map(Participant::id))
    }

    fn find_by_handle(&self, _handle: &str) -> crate::Result<Option<ParticipantId>> {
        Ok(None)
    }

    fn find_by_identity(&self, _identity: &str) -> crate::Result<Option<ParticipantId>> {
        Ok(None)
    }

    fn child_at(
        &self,
        parent: ParticipantId,
        _position: Position,
    ) -> crate::Result<Option<ParticipantId>> {
        Ok(self.other(parent).map(Participant::id))
    }

    fn children(&self, parent: ParticipantId) -> crate::Result<Vec<Participant>> {
        Ok(self.other(parent).cloned().into_iter().collect())
    }

    fn len(&self) -> crate::Result<usize> {
        Ok(2)
    }
}
