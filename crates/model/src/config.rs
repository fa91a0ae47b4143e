use typed_builder::TypedBuilder;

use crate::{
    identity::{IdentityResolver, LookupStrategy},
    placement::DEFAULT_MAX_DEPTH,
};

/// Default number of times a registration re-runs placement after losing a slot.
pub const DEFAULT_MAX_CONFLICT_RETRIES: usize = 3;

/// Network Config.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NetworkConfig {
    /// Maximum number of spillover steps.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,
    /// Maximum number of placement retries after a slot conflict.
    #[builder(default = DEFAULT_MAX_CONFLICT_RETRIES)]
    pub max_conflict_retries: usize,
    /// Lookup order used to resolve references.
    #[builder(default = LookupStrategy::DEFAULT_ORDER.to_vec())]
    pub lookup_order: Vec<LookupStrategy>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl NetworkConfig {
    /// Create the identity resolver for this config.
    pub fn identity_resolver(&self) -> IdentityResolver {
        IdentityResolver::with_strategies(self.lookup_order.iter().copied())
    }
}
