use std::fmt;

use crate::{Error, ParticipantId, ParticipantStore, ParticipantStoreExt};

/// A way of turning a human-facing reference into a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum LookupStrategy {
    /// Exact match on the external code.
    ByCode,
    /// Exact match on the handle.
    ByHandle,
    /// Match through a linked authentication identity.
    ByIndirectIdentity,
}

impl LookupStrategy {
    /// The default lookup order.
    pub const DEFAULT_ORDER: [Self; 3] = [Self::ByCode, Self::ByHandle, Self::ByIndirectIdentity];

    /// Run this lookup against the store.
    pub fn lookup<S: ParticipantStore + ?Sized>(
        &self,
        store: &S,
        reference: &str,
    ) -> crate::Result<Option<ParticipantId>> {
        match self {
            Self::ByCode => store.find_by_code(reference),
            Self::ByHandle => store.find_by_handle(reference),
            Self::ByIndirectIdentity => store.find_by_identity(reference),
        }
    }
}

/// A reference to a participant supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// An internal id.
    Id(ParticipantId),
    /// A code, handle or identity, resolved by [`IdentityResolver`].
    Text(String),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => id.fmt(f),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<ParticipantId> for Reference {
    fn from(id: ParticipantId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for Reference {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Reference {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Resolves references by trying lookup strategies in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolver {
    strategies: Vec<LookupStrategy>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self {
            strategies: LookupStrategy::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl IdentityResolver {
    /// Create a resolver with the given lookup order.
    pub fn with_strategies(strategies: impl IntoIterator<Item = LookupStrategy>) -> Self {
        Self {
            strategies: strategies.into_iter().collect(),
        }
    }

    /// Get the lookup order.
    pub fn strategies(&self) -> &[LookupStrategy] {
        &self.strategies
    }

    /// Resolve a text reference. The first matching strategy wins.
    pub fn resolve<S: ParticipantStore + ?Sized>(
        &self,
        store: &S,
        reference: &str,
    ) -> crate::Result<ParticipantId> {
        if reference.is_empty() {
            return Err(Error::not_found(reference));
        }
        for strategy in self.strategies.iter() {
            if let Some(id) = strategy.lookup(store, reference)? {
                tracing::debug!(reference, ?strategy, %id, "resolved reference");
                return Ok(id);
            }
        }
        tracing::debug!(reference, "unresolved reference");
        Err(Error::not_found(reference))
    }

    /// Resolve a [`Reference`], checking that an id reference exists.
    pub fn resolve_reference<S: ParticipantStore + ?Sized>(
        &self,
        store: &S,
        reference: &Reference,
    ) -> crate::Result<ParticipantId> {
        match reference {
            Reference::Id(id) => {
                if store.contains(*id)? {
                    Ok(*id)
                } else {
                    Err(Error::not_found(id))
                }
            }
            Reference::Text(text) => self.resolve(store, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, NewParticipant, ParticipantStoreMut};

    fn store() -> crate::Result<(MemoryStore, ParticipantId, ParticipantId)> {
        let mut store = MemoryStore::new();
        let a = store.insert(
            NewParticipant::builder()
                .external_code("alpha")
                .handle("bob")
                .build(),
        )?;
        let b = store.insert(
            NewParticipant::builder()
                .external_code("bob")
                .handle("carol")
                .build(),
        )?;
        store.link_identity("carol", a)?;
        store.link_identity("auth-7", b)?;
        Ok((store, a, b))
    }

    #[test]
    fn code_wins_over_handle_and_identity() -> crate::Result<()> {
        let (store, a, b) = store()?;
        let resolver = IdentityResolver::default();
        assert_eq!(resolver.resolve(&store, "alpha")?, a);
        // "bob" is both a code and a handle.
        assert_eq!(resolver.resolve(&store, "bob")?, b);
        // "carol" is both a handle and an identity.
        assert_eq!(resolver.resolve(&store, "carol")?, b);
        assert_eq!(resolver.resolve(&store, "auth-7")?, b);
        Ok(())
    }

    #[test]
    fn custom_order() -> crate::Result<()> {
        let (store, a, _) = store()?;
        let resolver = IdentityResolver::with_strategies([
            LookupStrategy::ByHandle,
            LookupStrategy::ByCode,
        ]);
        assert_eq!(resolver.resolve(&store, "bob")?, a);
        assert!(resolver.resolve(&store, "auth-7").is_err());
        Ok(())
    }

    #[test]
    fn unknown_references() -> crate::Result<()> {
        let (store, a, _) = store()?;
        let resolver = IdentityResolver::default();
        assert_eq!(
            resolver.resolve(&store, "does-not-exist"),
            Err(Error::NotFound("does-not-exist".to_string()))
        );
        assert!(matches!(resolver.resolve(&store, ""), Err(Error::NotFound(_))));
        assert_eq!(resolver.resolve_reference(&store, &Reference::Id(a))?, a);
        assert!(matches!(
            resolver.resolve_reference(&store, &ParticipantId::new(100).into()),
            Err(Error::NotFound(_))
        ));
        Ok(())
    }
}
