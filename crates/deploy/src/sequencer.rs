//! Deploy-then-configure sequencing.
//!
//! The order is fixed: NotStarted -> Deployed -> Configured.
//! Each stage is a type, so configuring an instance that was never deployed
//! does not compile, and each transition consumes the previous stage.

use alloy_core::primitives::Address;

use crate::{
    contract::{self, ContractArtifact},
    error::SequencerError,
    framework::{DeployedContract, DeploymentFramework},
    params::{DeploymentParams, TokenAllowlistEntry},
    rpc::TransactionReceipt,
};

/// Marker for a sequence that has not submitted anything yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotStarted;

/// Stage reached once the instance exists on-chain.
#[derive(Debug, Clone)]
pub struct Deployed {
    contract: DeployedContract,
}

/// Terminal stage: the instance is deployed and configured.
#[derive(Debug, Clone)]
pub struct Configured {
    contract: DeployedContract,
    receipt: TransactionReceipt,
}

/// Sealed trait for sequence stages.
mod sealed {
    pub trait Sealed {}
    impl Sealed for super::NotStarted {}
    impl Sealed for super::Deployed {}
    impl Sealed for super::Configured {}
}

/// Marker trait for valid sequence stages.
pub trait SequenceStage: sealed::Sealed + Send + Sync + 'static {}

impl SequenceStage for NotStarted {}
impl SequenceStage for Deployed {}
impl SequenceStage for Configured {}

/// Trait encoding valid stage transitions.
///
/// This is implemented only for valid transitions:
/// - NotStarted -> Deployed
/// - Deployed -> Configured
pub trait NextStage: SequenceStage {
    type Next: SequenceStage;
}

impl NextStage for NotStarted {
    type Next = Deployed;
}

impl NextStage for Deployed {
    type Next = Configured;
}

// Configured has no NextStage impl - it's terminal

/// Handle to a deployed roulette instance.
#[derive(Debug)]
pub struct ContractHandle<'f, F> {
    framework: &'f F,
    address: Address,
}

impl<F> Clone for ContractHandle<'_, F> {
    fn clone(&self) -> Self {
        Self {
            framework: self.framework,
            address: self.address,
        }
    }
}

impl<'f, F: DeploymentFramework> ContractHandle<'f, F> {
    /// Attach to an instance at `address`.
    pub fn new(framework: &'f F, address: Address) -> Self {
        Self { framework, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Call `setToken` and wait for the transaction to be mined.
    pub async fn set_token(&self, entry: &TokenAllowlistEntry) -> anyhow::Result<TransactionReceipt> {
        self.framework
            .transact(self.address, contract::encode_set_token(entry))
            .await
    }

    /// Read the allowlist entry of `token` through `tokenConfig`.
    pub async fn token_config(&self, token: Address) -> anyhow::Result<TokenAllowlistEntry> {
        let data = self
            .framework
            .read(self.address, contract::encode_token_config(token))
            .await?;
        contract::decode_token_config(token, &data)
    }
}

/// The deployment sequencer, in stage `S`.
#[derive(Debug)]
pub struct Sequencer<'f, F, S: SequenceStage> {
    framework: &'f F,
    stage: S,
}

impl<'f, F, S> Sequencer<'f, F, S>
where
    F: DeploymentFramework,
    S: NextStage,
{
    fn advance(self, next: S::Next) -> Sequencer<'f, F, S::Next> {
        Sequencer {
            framework: self.framework,
            stage: next,
        }
    }
}

impl<'f, F: DeploymentFramework> Sequencer<'f, F, NotStarted> {
    /// Start a new sequence. Nothing is sent until [`Self::deploy`].
    pub fn new(framework: &'f F) -> Self {
        Self {
            framework,
            stage: NotStarted,
        }
    }

    /// Deploy a new instance and wait until it is addressable.
    ///
    /// A handle is only produced once the creation transaction succeeded and
    /// code exists at the new address.
    pub async fn deploy(
        self,
        artifact: &ContractArtifact,
        params: &DeploymentParams,
    ) -> Result<Sequencer<'f, F, Deployed>, SequencerError> {
        tracing::info!(
            contract = %artifact.contract_name,
            fee_basis_points = %params.fee_basis_points,
            beneficiary = %params.beneficiary,
            sender = %self.framework.sender(),
            "Deploying contract..."
        );

        let deployed = self
            .framework
            .deploy(artifact, contract::encode_constructor_args(params))
            .await
            .map_err(SequencerError::Deployment)?;

        let code = self
            .framework
            .code_at(deployed.address)
            .await
            .map_err(SequencerError::Deployment)?;

        if code.is_empty() {
            return Err(SequencerError::Deployment(anyhow::anyhow!(
                "No code at {} after creation transaction {}",
                deployed.address,
                deployed.receipt.transaction_hash
            )));
        }

        tracing::info!(
            contract = %artifact.contract_name,
            address = %deployed.address,
            tx_hash = %deployed.receipt.transaction_hash,
            code_len = code.len(),
            "Contract deployed"
        );

        Ok(self.advance(Deployed { contract: deployed }))
    }
}

impl<'f, F: DeploymentFramework> Sequencer<'f, F, Deployed> {
    /// The deployed instance.
    pub fn contract(&self) -> &DeployedContract {
        &self.stage.contract
    }

    pub fn handle(&self) -> ContractHandle<'f, F> {
        ContractHandle::new(self.framework, self.stage.contract.address)
    }

    /// Apply the allowlist entry to the deployed instance.
    pub async fn configure(
        self,
        entry: &TokenAllowlistEntry,
    ) -> Result<Sequencer<'f, F, Configured>, SequencerError> {
        let address = self.stage.contract.address;

        tracing::info!(
            address = %address,
            token = %entry.token,
            enabled = entry.enabled,
            min_amount = %entry.min_amount,
            max_amount = %entry.max_amount,
            "Configuring token allowlist..."
        );

        let receipt = self
            .handle()
            .set_token(entry)
            .await
            .map_err(|source| SequencerError::Configuration { address, source })?;

        tracing::info!(
            address = %address,
            tx_hash = %receipt.transaction_hash,
            "Token allowlist configured"
        );

        let contract = self.stage.contract.clone();
        Ok(self.advance(Configured { contract, receipt }))
    }
}

impl<'f, F: DeploymentFramework> Sequencer<'f, F, Configured> {
    /// The deployed instance.
    pub fn contract(&self) -> &DeployedContract {
        &self.stage.contract
    }

    /// Receipt of the configuration call.
    pub fn receipt(&self) -> &TransactionReceipt {
        &self.stage.receipt
    }

    pub fn handle(&self) -> ContractHandle<'f, F> {
        ContractHandle::new(self.framework, self.stage.contract.address)
    }

    /// Read the allowlist entry back and compare it with what was applied.
    pub async fn verify(&self, expected: &TokenAllowlistEntry) -> Result<(), SequencerError> {
        let address = self.stage.contract.address;
        let actual = self
            .handle()
            .token_config(expected.token)
            .await
            .map_err(|source| SequencerError::Configuration { address, source })?;

        if actual != *expected {
            return Err(SequencerError::Configuration {
                address,
                source: anyhow::anyhow!(
                    "Allowlist entry mismatch: expected {:?}, instance reports {:?}",
                    expected,
                    actual
                ),
            });
        }

        tracing::info!(address = %address, token = %expected.token, "Allowlist entry verified");
        Ok(())
    }
}
