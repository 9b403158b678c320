//! Migration configuration.
//!
//! Values are layered with figment: built-in defaults, then the selected
//! network profile of a TOML file (with `[default]` applying to every
//! network), then `ROULETTE_`-prefixed environment variables.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::rpc::{self, ConfirmationPolicy};

/// The default name of the migration configuration file.
pub const CONFIG_FILENAME: &str = "Migrate.toml";

/// The network profile used when none is selected.
pub const DEFAULT_NETWORK: &str = "development";

/// Prefix of the environment variables overriding the configuration.
pub const ENV_PREFIX: &str = "ROULETTE_";

/// Transaction confirmation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Interval between two receipt lookups, in milliseconds.
    pub poll_interval_ms: u64,
    /// Time to wait for a transaction to be mined, in seconds.
    pub timeout_secs: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        // 50 blocks of 15 seconds.
        Self {
            poll_interval_ms: 1000,
            timeout_secs: 750,
        }
    }
}

impl ConfirmationConfig {
    pub fn policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Resolved configuration of a migration run against one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Name of the selected network profile.
    #[serde(skip)]
    pub network: String,
    /// JSON-RPC endpoint of the node.
    pub rpc_url: String,
    /// Sender account. Takes precedence over `mnemonic`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// BIP-39 mnemonic whose first account is the sender.
    ///
    /// Never written back by [`Self::save_to_file`].
    #[serde(default, skip_serializing)]
    pub mnemonic: Option<String>,
    /// Expected chain ID of the node, checked before sending anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Path to the compiled contract artifact.
    pub artifact: PathBuf,
    /// Directory holding the deployment record.
    pub outdata: PathBuf,
    /// Per-request HTTP timeout, in seconds.
    pub request_timeout_secs: u64,
    /// Read the allowlist entry back after configuring it.
    pub verify: bool,
    /// Transaction confirmation settings.
    pub confirmation: ConfirmationConfig,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            network: DEFAULT_NETWORK.to_string(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            from: None,
            mnemonic: None,
            chain_id: None,
            artifact: PathBuf::from("build/contracts/Roulette.json"),
            outdata: PathBuf::from("."),
            request_timeout_secs: rpc::DEFAULT_TIMEOUT.as_secs(),
            verify: false,
            confirmation: ConfirmationConfig::default(),
        }
    }
}

impl MigrationConfig {
    /// Build the provider stack for a configuration file.
    ///
    /// A missing file contributes nothing.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path).nested())
            .merge(Env::prefixed(ENV_PREFIX).split("__").global())
    }

    /// Load the configuration of `network` from a file and the environment.
    pub fn load(path: &Path, network: &str) -> Result<Self> {
        let config = Self::extract(Self::figment(path), network)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        tracing::info!(path = %path.display(), network, "Configuration loaded");
        Ok(config)
    }

    /// Extract the configuration of `network` from a provider stack.
    pub fn extract(figment: Figment, network: &str) -> Result<Self> {
        let mut config: Self = figment
            .select(network)
            .extract()
            .with_context(|| format!("Invalid configuration for network '{}'", network))?;
        config.network = network.to_string();
        Ok(config)
    }

    /// Save the configuration to a TOML file, under its network profile.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut profiles = toml::Table::new();
        profiles.insert(
            self.network.clone(),
            toml::Value::try_from(self).context("Failed to serialize configuration to TOML")?,
        );
        let content = toml::to_string_pretty(&profiles)
            .context("Failed to serialize configuration to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
