//! roulette-migrate deploys the roulette contract and allowlists its wager token.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use roulette_deploy::{
    ContractArtifact, DeploymentRecord, InitialMigration, MigrationConfig, RpcFramework,
};

/// The name the resolved configuration is saved under.
const RESOLVED_CONFIG_FILENAME: &str = "Migrate.resolved.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let config = MigrationConfig::load(&cli.config, &cli.network)?;
    let config = cli.apply_overrides(config);

    if cli.save_config {
        std::fs::create_dir_all(&config.outdata)
            .context("Failed to create output data directory")?;
        config.save_to_file(&config.outdata.join(RESOLVED_CONFIG_FILENAME))?;
    }

    let artifact = ContractArtifact::load_from_file(&config.artifact)?;
    let framework = RpcFramework::connect(&config).await?;

    let record = match std::fs::create_dir_all(&config.outdata) {
        Ok(()) => Some(DeploymentRecord::new(
            &config.outdata,
            config.network.clone(),
            framework.chain_id(),
        )),
        Err(e) => {
            tracing::warn!(
                outdata = %config.outdata.display(),
                error = %e,
                "Output data directory unavailable, deployment will not be recorded"
            );
            None
        }
    };

    tracing::info!(
        network = %config.network,
        chain_id = framework.chain_id(),
        "Starting initial migration..."
    );

    InitialMigration::new(config.verify)
        .run(&framework, &artifact, record.as_ref())
        .await?;

    Ok(())
}
