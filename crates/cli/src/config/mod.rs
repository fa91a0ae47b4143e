mod network;

/// Output format.
pub mod output;

use std::path::PathBuf;

use binet_model::NetworkConfig;
use network::NetworkArgs;
use output::OutputFormat;

const DEFAULT_STATE: &str = "~/.local/share/binet/network.json";

/// Configuration.
#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct Config {
    /// Path to the network state file.
    #[arg(long, short)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    /// Output format.
    #[arg(long, short, value_enum)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<OutputFormat>,
    /// Placement and lookup parameters.
    #[command(flatten)]
    #[serde(flatten)]
    network: NetworkArgs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state: Some(DEFAULT_STATE.to_string()),
            output: Some(OutputFormat::default()),
            network: NetworkArgs::from_config(&NetworkConfig::default()),
        }
    }
}

impl Config {
    /// Returns the expanded path of the state file.
    pub fn state_path(&self) -> eyre::Result<PathBuf> {
        let raw = self.state.as_deref().unwrap_or(DEFAULT_STATE);
        Ok(PathBuf::from(shellexpand::full(raw)?.into_owned()))
    }

    /// Returns the output format.
    pub fn output(&self) -> OutputFormat {
        self.output.unwrap_or_default()
    }

    /// Returns the network config.
    pub fn network_config(&self) -> NetworkConfig {
        self.network.network_config()
    }
}
