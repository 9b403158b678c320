//! The initial migration: deploy the roulette contract, then allowlist the
//! wager token on it.

use alloy_core::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::{
    contract::ContractArtifact,
    error::SequencerError,
    framework::DeploymentFramework,
    params::{DeploymentParams, TokenAllowlistEntry},
    record::DeploymentRecord,
    sequencer::Sequencer,
};

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOutcome {
    /// Address of the new instance.
    pub address: Address,
    /// Hash of the contract-creation transaction.
    pub deploy_tx: B256,
    /// Hash of the `setToken` transaction.
    pub configure_tx: B256,
}

/// The fixed two-call sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitialMigration {
    /// Constructor arguments.
    pub params: DeploymentParams,
    /// Allowlist entry applied after deployment.
    pub entry: TokenAllowlistEntry,
    /// Read the entry back once applied.
    pub verify: bool,
}

impl InitialMigration {
    /// Run the migration with its literal parameters.
    pub fn new(verify: bool) -> Self {
        Self {
            verify,
            ..Default::default()
        }
    }

    /// Deploy a fresh instance and configure it.
    ///
    /// Every call deploys a new instance; instances from earlier runs are
    /// never looked up or touched. When a record is given, the deployment is
    /// written to it before configuration starts, so a failed configuration
    /// still leaves the instance address on disk.
    pub async fn run<F: DeploymentFramework>(
        &self,
        framework: &F,
        artifact: &ContractArtifact,
        record: Option<&DeploymentRecord>,
    ) -> Result<MigrationOutcome, SequencerError> {
        let deployed = Sequencer::new(framework).deploy(artifact, &self.params).await?;

        let run_index = record.and_then(|record| {
            let contract = deployed.contract();
            record
                .record_deployed(
                    &artifact.contract_name,
                    contract.address,
                    contract.receipt.transaction_hash,
                )
                .inspect_err(|e| {
                    tracing::warn!(
                        path = %record.path().display(),
                        error = %e,
                        "Failed to record deployment"
                    );
                })
                .ok()
        });

        let configured = deployed.configure(&self.entry).await?;

        if self.verify {
            configured.verify(&self.entry).await?;
        }

        let outcome = MigrationOutcome {
            address: configured.contract().address,
            deploy_tx: configured.contract().receipt.transaction_hash,
            configure_tx: configured.receipt().transaction_hash,
        };

        if let (Some(record), Some(index)) = (record, run_index) {
            if let Err(e) = record.record_configured(index, outcome.configure_tx) {
                tracing::warn!(
                    path = %record.path().display(),
                    error = %e,
                    "Failed to record configuration"
                );
            }
        }

        tracing::info!(
            address = %outcome.address,
            deploy_tx = %outcome.deploy_tx,
            configure_tx = %outcome.configure_tx,
            "✓ Migration complete!"
        );

        Ok(outcome)
    }
}
