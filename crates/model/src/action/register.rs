use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use crate::{
    Error, NetworkConfig, NewParticipant, Participant, ParticipantId, ParticipantStoreExt,
    ParticipantStoreMut, Placement, PlacementResolver, Position, Reference,
};

use super::NetworkAction;

/// Registration params.
#[derive(Debug, Clone, TypedBuilder)]
pub struct Registration {
    /// External code of the new participant.
    #[builder(setter(into))]
    pub external_code: String,
    /// Handle of the new participant.
    #[builder(default = None, setter(into, strip_option))]
    pub handle: Option<String>,
    /// The referring participant.
    #[builder(default = None, setter(into, strip_option))]
    pub sponsor: Option<Reference>,
    /// The requested placement parent. Defaults to the sponsor.
    #[builder(default = None, setter(into, strip_option))]
    pub parent: Option<Reference>,
    /// The requested side. Required unless a root is registered.
    #[builder(default = None, setter(strip_option))]
    pub position: Option<Position>,
    /// Initial value.
    #[builder(default = None, setter(strip_option))]
    pub value: Option<Decimal>,
    /// Authentication identity to link.
    #[builder(default = None, setter(into, strip_option))]
    pub identity: Option<String>,
}

impl Registration {
    /// Get the external code.
    pub fn external_code(&self) -> &str {
        &self.external_code
    }

    /// Returns whether this registration creates a tree root.
    pub fn is_root(&self) -> bool {
        self.sponsor.is_none() && self.parent.is_none()
    }

    fn new_participant(
        &self,
        sponsor_id: Option<ParticipantId>,
        slot: Option<(ParticipantId, Position)>,
    ) -> NewParticipant {
        NewParticipant {
            external_code: self.external_code.clone(),
            handle: self.handle.clone(),
            sponsor_id,
            slot,
            value: self.value,
            identity: self.identity.clone(),
        }
    }
}

/// Register a new participant.
#[must_use = "actions do nothing unless you `execute` them"]
pub struct Register<'a, S: ?Sized> {
    store: &'a mut S,
    params: Registration,
    config: NetworkConfig,
}

/// Report of the execution of registration.
#[derive(Debug, Clone)]
pub struct RegistrationReport {
    participant: Participant,
    placement: Option<Placement>,
    attempts: usize,
}

impl RegistrationReport {
    /// Get the registered participant.
    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    /// Get the placement, `None` for a root.
    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    /// Get the number of placement attempts.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl<'a, S: ParticipantStoreMut + ?Sized> Register<'a, S> {
    /// Create a new registration against the given store.
    pub fn try_new(
        store: &'a mut S,
        params: Registration,
        config: NetworkConfig,
    ) -> crate::Result<Self> {
        if params.external_code.is_empty() {
            return Err(Error::InvalidArgument("empty external code"));
        }
        if !params.is_root() && params.position.is_none() {
            return Err(Error::InvalidPosition(String::new()));
        }
        if matches!(params.identity.as_deref(), Some("")) {
            return Err(Error::InvalidArgument("empty identity"));
        }
        Ok(Self {
            store,
            params,
            config,
        })
    }

    fn place(
        &mut self,
        sponsor_id: Option<ParticipantId>,
        parent: &Reference,
        position: Position,
    ) -> crate::Result<(ParticipantId, Placement, usize)> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let placement = PlacementResolver::with_config(&*self.store, &self.config)
                .resolve_placement(parent, position)?;
            let participant = self
                .params
                .new_participant(sponsor_id, Some((placement.parent(), position)));
            match self.store.insert(participant) {
                Ok(id) => return Ok((id, placement, attempts)),
                Err(err) if err.is_retryable() && attempts <= self.config.max_conflict_retries => {
                    tracing::warn!(%err, attempts, "placement conflict, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<S: ParticipantStoreMut + ?Sized> NetworkAction for Register<'_, S> {
    type Report = RegistrationReport;

    fn execute(mut self) -> crate::Result<Self::Report> {
        let identity = self.config.identity_resolver();
        let sponsor_id = self
            .params
            .sponsor
            .as_ref()
            .map(|sponsor| identity.resolve_reference(&*self.store, sponsor))
            .transpose()?;
        let parent = self
            .params
            .parent
            .clone()
            .or_else(|| sponsor_id.map(Reference::Id));

        let (id, placement, attempts) = match parent {
            Some(parent) => {
                let position = self
                    .params
                    .position
                    .ok_or_else(|| Error::InvalidPosition(String::new()))?;
                let (id, placement, attempts) = self.place(sponsor_id, &parent, position)?;
                (id, Some(placement), attempts)
            }
            None => {
                let participant = self.params.new_participant(sponsor_id, None);
                (self.store.insert(participant)?, None, 1)
            }
        };

        let participant = self.store.get(id)?;
        tracing::debug!(
            %id,
            code = participant.external_code(),
            sponsor = ?participant.sponsor_id(),
            slot = ?participant.slot(),
            attempts,
            "registered participant"
        );
        Ok(RegistrationReport {
            participant,
            placement,
            attempts,
        })
    }
}
