//! The deployment framework seam.
//!
//! [`DeploymentFramework`] is everything the sequencer needs from the outside
//! world: submit a contract creation, submit a call, read state. Signing,
//! gas estimation and nonce assignment stay on the node side.

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes, U64};
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

use crate::{
    accounts,
    config::MigrationConfig,
    contract::ContractArtifact,
    rpc::{self, ConfirmationPolicy, TransactionReceipt},
};

/// A contract instance whose creation transaction has been mined successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    /// Address of the new instance.
    pub address: Address,
    /// Receipt of the creation transaction.
    pub receipt: TransactionReceipt,
}

/// External collaborator that compiles nothing but submits and confirms
/// transactions on behalf of the sequencer.
pub trait DeploymentFramework: Send + Sync {
    /// Account the transactions are sent from.
    fn sender(&self) -> Address;

    /// Submit a contract creation and wait for it to be mined.
    ///
    /// Resolves only once the creation succeeded and produced an address.
    fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: Bytes,
    ) -> impl Future<Output = Result<DeployedContract>> + Send;

    /// Submit a call to a deployed contract and wait for it to be mined.
    ///
    /// A reverted call is an error.
    fn transact(
        &self,
        to: Address,
        calldata: Bytes,
    ) -> impl Future<Output = Result<TransactionReceipt>> + Send;

    /// Execute a read-only call against the latest state.
    fn read(&self, to: Address, calldata: Bytes) -> impl Future<Output = Result<Bytes>> + Send;

    /// Fetch the runtime code at an address.
    fn code_at(&self, address: Address) -> impl Future<Output = Result<Bytes>> + Send;
}

/// [`DeploymentFramework`] backed by an Ethereum JSON-RPC endpoint.
///
/// Transactions go through `eth_sendTransaction`, so the sender must be an
/// account the node can sign for.
#[derive(Debug, Clone)]
pub struct RpcFramework {
    client: reqwest::Client,
    url: String,
    sender: Address,
    chain_id: u64,
    confirmation: ConfirmationPolicy,
}

impl RpcFramework {
    /// Connect to the configured endpoint and resolve the sender account.
    ///
    /// Fails before anything is sent if the endpoint reports an unexpected
    /// chain ID.
    pub async fn connect(config: &MigrationConfig) -> Result<Self> {
        let url = Url::parse(&config.rpc_url)
            .with_context(|| format!("Invalid RPC URL '{}'", config.rpc_url))?;
        let client = rpc::create_client(config.request_timeout())?;

        let chain_id: U64 = rpc::json_rpc_call(&client, url.as_str(), "eth_chainId", vec![])
            .await
            .with_context(|| format!("Failed to reach node at {}", url))?;
        let chain_id = chain_id.to::<u64>();

        if let Some(expected) = config.chain_id {
            if expected != chain_id {
                anyhow::bail!(
                    "Chain ID mismatch: network '{}' expects {}, node at {} reports {}",
                    config.network,
                    expected,
                    url,
                    chain_id
                );
            }
        }

        let sender = match (config.from, config.mnemonic.as_deref()) {
            (Some(from), _) => from,
            (None, Some(phrase)) => accounts::sender_from_mnemonic(phrase, 0)?,
            (None, None) => {
                let accounts: Vec<Address> =
                    rpc::json_rpc_call(&client, url.as_str(), "eth_accounts", vec![])
                        .await
                        .context("Failed to list node accounts")?;
                *accounts
                    .first()
                    .context("Node exposes no accounts and no sender was configured")?
            }
        };

        tracing::info!(
            rpc_url = %url,
            chain_id,
            sender = %sender,
            "Connected to node"
        );

        Ok(Self {
            client,
            url: url.to_string(),
            sender,
            chain_id,
            confirmation: config.confirmation.policy(),
        })
    }

    /// Chain ID reported by the node.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn send_transaction(&self, tx: Value) -> Result<TransactionReceipt> {
        let tx_hash: B256 =
            rpc::json_rpc_call(&self.client, &self.url, "eth_sendTransaction", vec![tx])
                .await
                .context("Failed to submit transaction")?;

        tracing::debug!(tx_hash = %tx_hash, "Transaction submitted, waiting to be mined...");

        rpc::wait_for_receipt(&self.client, &self.url, tx_hash, self.confirmation).await
    }
}

impl DeploymentFramework for RpcFramework {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: Bytes,
    ) -> Result<DeployedContract> {
        let mut init_code = artifact.bytecode.to_vec();
        init_code.extend_from_slice(&constructor_args);

        let receipt = self
            .send_transaction(serde_json::json!({
                "from": self.sender,
                "data": Bytes::from(init_code),
            }))
            .await
            .with_context(|| format!("Failed to deploy {}", artifact.contract_name))?;

        if !receipt.succeeded() {
            anyhow::bail!(
                "Creation of {} reverted in transaction {}",
                artifact.contract_name,
                receipt.transaction_hash
            );
        }

        let address = receipt.contract_address.with_context(|| {
            format!(
                "Receipt of {} carries no contract address",
                receipt.transaction_hash
            )
        })?;

        Ok(DeployedContract { address, receipt })
    }

    async fn transact(&self, to: Address, calldata: Bytes) -> Result<TransactionReceipt> {
        let receipt = self
            .send_transaction(serde_json::json!({
                "from": self.sender,
                "to": to,
                "data": calldata,
            }))
            .await
            .with_context(|| format!("Failed to call {}", to))?;

        if !receipt.succeeded() {
            anyhow::bail!(
                "Call to {} reverted in transaction {}",
                to,
                receipt.transaction_hash
            );
        }

        Ok(receipt)
    }

    async fn read(&self, to: Address, calldata: Bytes) -> Result<Bytes> {
        rpc::json_rpc_call(
            &self.client,
            &self.url,
            "eth_call",
            vec![
                serde_json::json!({
                    "from": self.sender,
                    "to": to,
                    "data": calldata,
                }),
                serde_json::json!("latest"),
            ],
        )
        .await
        .with_context(|| format!("Failed to read from {}", to))
    }

    async fn code_at(&self, address: Address) -> Result<Bytes> {
        rpc::json_rpc_call(
            &self.client,
            &self.url,
            "eth_getCode",
            vec![serde_json::json!(address), serde_json::json!("latest")],
        )
        .await
        .with_context(|| format!("Failed to fetch code at {}", address))
    }
}
