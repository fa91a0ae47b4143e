use binet_model::{LookupStrategy, NetworkConfig};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Default, Clone)]
pub(crate) struct NetworkArgs {
    /// Maximum number of spillover steps before placement fails.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_depth: Option<usize>,
    /// Maximum number of placement retries after losing a slot.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_conflict_retries: Option<usize>,
    /// Order in which references are looked up.
    #[arg(long, value_delimiter = ',', value_parser = parse_lookup_strategy)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lookup_order: Option<Vec<LookupStrategy>>,
}

impl NetworkArgs {
    pub(crate) fn from_config(config: &NetworkConfig) -> Self {
        Self {
            max_depth: Some(config.max_depth),
            max_conflict_retries: Some(config.max_conflict_retries),
            lookup_order: Some(config.lookup_order.clone()),
        }
    }

    pub(crate) fn network_config(&self) -> NetworkConfig {
        let mut config = NetworkConfig::default();
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(retries) = self.max_conflict_retries {
            config.max_conflict_retries = retries;
        }
        if let Some(order) = self.lookup_order.as_ref() {
            config.lookup_order = order.clone();
        }
        config
    }
}

fn parse_lookup_strategy(s: &str) -> eyre::Result<LookupStrategy> {
    match s.trim() {
        "code" | "by-code" => Ok(LookupStrategy::ByCode),
        "handle" | "by-handle" => Ok(LookupStrategy::ByHandle),
        "identity" | "by-indirect-identity" => Ok(LookupStrategy::ByIndirectIdentity),
        other => eyre::bail!("unknown lookup strategy: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_args_keep_defaults() {
        let args = NetworkArgs {
            max_depth: Some(8),
            ..Default::default()
        };
        let config = args.network_config();
        assert_eq!(config.max_depth, 8);
        assert_eq!(
            config.max_conflict_retries,
            NetworkConfig::default().max_conflict_retries
        );
        assert_eq!(config.lookup_order, LookupStrategy::DEFAULT_ORDER.to_vec());
    }

    #[test]
    fn parse_strategies() {
        assert_eq!(
            parse_lookup_strategy("handle").unwrap(),
            LookupStrategy::ByHandle
        );
        assert_eq!(
            parse_lookup_strategy("by-indirect-identity").unwrap(),
            LookupStrategy::ByIndirectIdentity
        );
        assert!(parse_lookup_strategy("email").is_err());
    }
}
