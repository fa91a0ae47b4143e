use std::path::Path;

use binet_model::{MemoryStore, NetworkConfig};
use enum_dispatch::enum_dispatch;
use eyre::WrapErr;
use tokio::fs;

use crate::config::{output::OutputFormat, Config};

use init_config::InitConfig;
use init_root::InitRoot;
use link_identity::LinkIdentity;
use list::List;
use place::Place;
use register::Register;
use resolve::Resolve;
use set_value::SetValue;
use tree::Tree;

mod init_config;
mod init_root;
mod link_identity;
mod list;
mod place;
mod register;
mod resolve;
mod set_value;
mod tree;
mod utils;

/// Commands.
#[enum_dispatch]
#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Initialize config file.
    InitConfig(InitConfig),
    /// Create a tree root.
    InitRoot(InitRoot),
    /// Register a participant under a sponsor.
    Register(Register),
    /// Show where a new participant would be placed, without registering.
    Place(Place),
    /// Resolve a reference to a participant.
    Resolve(Resolve),
    /// Show the subtree of a participant with its roll-up statistics.
    Tree(Tree),
    /// Set or clear the value of a participant.
    SetValue(SetValue),
    /// Link an authentication identity to a participant.
    LinkIdentity(LinkIdentity),
    /// List participants.
    List(List),
}

#[enum_dispatch(Commands)]
pub(crate) trait Command {
    async fn execute(&self, ctx: Context<'_>) -> eyre::Result<()>;
}

/// Execution context.
pub struct Context<'a> {
    config_path: &'a Path,
    state_path: &'a Path,
    config: &'a Config,
}

impl<'a> Context<'a> {
    pub(crate) fn new(config_path: &'a Path, state_path: &'a Path, config: &'a Config) -> Self {
        Self {
            config_path,
            state_path,
            config,
        }
    }

    pub(crate) fn config_path(&self) -> &Path {
        self.config_path
    }

    pub(crate) fn output(&self) -> OutputFormat {
        self.config.output()
    }

    pub(crate) fn network_config(&self) -> NetworkConfig {
        self.config.network_config()
    }

    /// Load the network state. A missing state file is an empty network.
    pub(crate) async fn load_store(&self) -> eyre::Result<MemoryStore> {
        if !fs::try_exists(self.state_path).await? {
            tracing::debug!(
                path = %self.state_path.display(),
                "state file not found, starting empty"
            );
            return Ok(MemoryStore::new());
        }
        let content = fs::read(self.state_path).await?;
        let store = serde_json::from_slice(&content).wrap_err_with(|| {
            format!("failed to load state from {}", self.state_path.display())
        })?;
        Ok(store)
    }

    /// Persist the network state, replacing the state file atomically.
    pub(crate) async fn save_store(&self, store: &MemoryStore) -> eyre::Result<()> {
        if let Some(parent) = self.state_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_vec_pretty(store)?;
        let tmp = self.state_path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, self.state_path).await?;
        tracing::debug!(path = %self.state_path.display(), "saved state");
        Ok(())
    }
}
