//! roulette-deploy - Initial migration of the roulette contract.
//!
//! This crate deploys one roulette instance with fixed constructor parameters
//! and then allowlists the wager token on it, in that order and exactly once
//! per run.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use roulette_deploy::{ContractArtifact, InitialMigration, MigrationConfig, RpcFramework};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = MigrationConfig::load(Path::new("Migrate.toml"), "development")?;
//! let framework = RpcFramework::connect(&config).await?;
//! let artifact = ContractArtifact::load_from_file(&config.artifact)?;
//!
//! let outcome = InitialMigration::new(false)
//!     .run(&framework, &artifact, None)
//!     .await?;
//! println!("roulette deployed at {}", outcome.address);
//! # Ok(())
//! # }
//! ```

mod accounts;
pub use accounts::sender_from_mnemonic;

mod config;
pub use config::{
    CONFIG_FILENAME, ConfirmationConfig, DEFAULT_NETWORK, ENV_PREFIX, MigrationConfig,
};

pub mod contract;
pub use contract::ContractArtifact;

mod error;
pub use error::SequencerError;

mod framework;
pub use framework::{DeployedContract, DeploymentFramework, RpcFramework};

mod migration;
pub use migration::{InitialMigration, MigrationOutcome};

pub mod params;
pub use params::{DeploymentParams, TokenAllowlistEntry};

mod record;
pub use record::{DEPLOYMENTS_FILENAME, DeploymentRecord, DeploymentsFile, MigrationRun};

pub mod rpc;
pub use rpc::{ConfirmationPolicy, TransactionReceipt};

mod sequencer;
pub use sequencer::{
    Configured, ContractHandle, Deployed, NextStage, NotStarted, SequenceStage, Sequencer,
};
