//! Deployment record.
//!
//! Every run appends one entry to `deployments.json` in the output data
//! directory. The file is only ever written by a run, never consulted to
//! reuse an earlier instance.

use std::path::{Path, PathBuf};

use alloy_core::primitives::{Address, B256};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The name of the deployment record file.
pub const DEPLOYMENTS_FILENAME: &str = "deployments.json";

/// One migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRun {
    /// Network profile the run targeted.
    pub network: String,
    /// Chain ID reported by the node.
    pub chain_id: u64,
    /// Name of the deployed contract.
    pub contract: String,
    /// Address of the deployed instance.
    pub address: Address,
    /// Hash of the contract-creation transaction.
    pub deploy_tx: B256,
    /// Hash of the configuration transaction, once it is mined.
    pub configure_tx: Option<B256>,
    /// Unix timestamp of the deployment.
    pub deployed_at: i64,
}

/// Contents of the deployment record file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentsFile {
    #[serde(default)]
    pub runs: Vec<MigrationRun>,
}

impl DeploymentsFile {
    /// Load the record, or an empty one if the file does not exist yet.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployments from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deployments file {}", path.display()))
    }

    /// Save the record as formatted JSON.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize deployments")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write deployments to {}", path.display()))
    }
}

/// Writes the runs of one network into the deployment record file.
#[derive(Debug, Clone)]
pub struct DeploymentRecord {
    path: PathBuf,
    network: String,
    chain_id: u64,
}

impl DeploymentRecord {
    /// Record runs into `outdata/deployments.json`.
    pub fn new(outdata: &Path, network: impl Into<String>, chain_id: u64) -> Self {
        Self {
            path: outdata.join(DEPLOYMENTS_FILENAME),
            network: network.into(),
            chain_id,
        }
    }

    /// Path of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a freshly deployed, not yet configured instance.
    ///
    /// Returns the index of the new run.
    pub fn record_deployed(&self, contract: &str, address: Address, deploy_tx: B256) -> Result<usize> {
        let mut file = DeploymentsFile::load_from_file(&self.path)?;
        file.runs.push(MigrationRun {
            network: self.network.clone(),
            chain_id: self.chain_id,
            contract: contract.to_string(),
            address,
            deploy_tx,
            configure_tx: None,
            deployed_at: chrono::Utc::now().timestamp(),
        });
        file.save_to_file(&self.path)?;

        tracing::debug!(path = %self.path.display(), address = %address, "Deployment recorded");
        Ok(file.runs.len() - 1)
    }

    /// Mark the run at `index` as configured.
    pub fn record_configured(&self, index: usize, configure_tx: B256) -> Result<()> {
        let mut file = DeploymentsFile::load_from_file(&self.path)?;
        let run = file
            .runs
            .get_mut(index)
            .with_context(|| format!("No run #{} in {}", index, self.path.display()))?;
        run.configure_tx = Some(configure_tx);
        file.save_to_file(&self.path)
    }
}
