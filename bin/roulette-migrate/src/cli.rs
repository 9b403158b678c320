use std::path::PathBuf;

use alloy_core::primitives::Address;
use clap::Parser;
use roulette_deploy::{CONFIG_FILENAME, DEFAULT_NETWORK, MigrationConfig, params::parse_address};
use tracing::level_filters::LevelFilter;

#[derive(Debug, Parser)]
#[command(name = "roulette-migrate")]
#[command(
    author,
    version,
    about = "Deploy the roulette contract and allowlist its wager token"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "ROULETTE_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to the migration configuration file.
    ///
    /// A missing file is not an error: built-in defaults and environment
    /// variables apply.
    #[arg(short, long, alias = "conf", env = "ROULETTE_CONFIG", default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    /// The network profile to select in the configuration file.
    #[arg(short, long, env = "ROULETTE_NETWORK", default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// Override the JSON-RPC endpoint of the node.
    #[arg(long, alias = "rpc")]
    pub rpc_url: Option<String>,

    /// Override the sender account (0x-prefixed).
    #[arg(long, value_parser = parse_address)]
    pub from: Option<Address>,

    /// Override the path to the compiled contract artifact.
    #[arg(long)]
    pub artifact: Option<PathBuf>,

    /// Override the directory holding the deployment record.
    #[arg(long)]
    pub outdata: Option<PathBuf>,

    /// Read the allowlist entry back after configuring it.
    #[arg(long)]
    pub verify: bool,

    /// Save the resolved configuration next to the deployment record before running.
    #[arg(long)]
    pub save_config: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration.
    pub fn apply_overrides(&self, mut config: MigrationConfig) -> MigrationConfig {
        if let Some(rpc_url) = &self.rpc_url {
            config.rpc_url = rpc_url.clone();
        }
        if let Some(from) = self.from {
            config.from = Some(from);
        }
        if let Some(artifact) = &self.artifact {
            config.artifact = artifact.clone();
        }
        if let Some(outdata) = &self.outdata {
            config.outdata = outdata.clone();
        }
        config.verify |= self.verify;
        config
    }
}
