//! Solidity surface of the roulette contract and its compiled artifact.

use std::{path::Path, str::FromStr};

use alloy_core::{
    primitives::{Address, Bytes},
    sol,
    sol_types::{SolCall, SolConstructor},
};
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::params::{DeploymentParams, TokenAllowlistEntry};

sol! {
    /// The subset of the roulette ABI touched by the deployment step.
    contract Roulette {
        constructor(uint256 feeBasisPoints, address beneficiary);

        function setToken(address token, bool enabled, uint256 minAmount, uint256 maxAmount) external;

        function tokenConfig(address token) external view returns (bool enabled, uint256 minAmount, uint256 maxAmount);
    }
}

/// Marker left by the compiler in bytecode whose libraries are not linked.
const LINK_PLACEHOLDER: &str = "__";

/// Raw artifact as written by the compiler toolchain.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: String,
    #[serde(default)]
    bytecode: String,
}

/// A compiled contract ready to be deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    /// Contract name, used for logs and the deployment record.
    pub contract_name: String,
    /// Creation bytecode without constructor arguments.
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Load an artifact from a compiled contract JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact from {}", path.display()))?;
        let artifact = Self::from_json(&content)
            .with_context(|| format!("Invalid artifact {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            contract = %artifact.contract_name,
            bytecode_len = artifact.bytecode.len(),
            "Artifact loaded"
        );
        Ok(artifact)
    }

    /// Parse an artifact from its JSON representation.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawArtifact =
            serde_json::from_str(content).context("Failed to parse artifact JSON")?;

        if raw.bytecode.contains(LINK_PLACEHOLDER) {
            anyhow::bail!(
                "Artifact for {} contains unlinked library placeholders",
                raw.contract_name
            );
        }

        let bytecode = Bytes::from_str(&raw.bytecode)
            .with_context(|| format!("Artifact for {} has malformed bytecode", raw.contract_name))?;

        if bytecode.is_empty() {
            anyhow::bail!(
                "Artifact for {} has no bytecode (abstract contract or interface?)",
                raw.contract_name
            );
        }

        Ok(Self {
            contract_name: raw.contract_name,
            bytecode,
        })
    }
}

/// ABI-encode the constructor arguments.
pub fn encode_constructor_args(params: &DeploymentParams) -> Bytes {
    Roulette::constructorCall {
        feeBasisPoints: params.fee_basis_points,
        beneficiary: params.beneficiary,
    }
    .abi_encode()
    .into()
}

/// Encode a `setToken` call for an allowlist entry.
pub fn encode_set_token(entry: &TokenAllowlistEntry) -> Bytes {
    Roulette::setTokenCall {
        token: entry.token,
        enabled: entry.enabled,
        minAmount: entry.min_amount,
        maxAmount: entry.max_amount,
    }
    .abi_encode()
    .into()
}

/// Decode `setToken` calldata back into an allowlist entry.
pub fn decode_set_token(calldata: &[u8]) -> Result<TokenAllowlistEntry> {
    let call = Roulette::setTokenCall::abi_decode(calldata, true)
        .context("Calldata is not a setToken call")?;
    Ok(TokenAllowlistEntry {
        token: call.token,
        enabled: call.enabled,
        min_amount: call.minAmount,
        max_amount: call.maxAmount,
    })
}

/// Encode a `tokenConfig` view call.
pub fn encode_token_config(token: Address) -> Bytes {
    Roulette::tokenConfigCall { token }.abi_encode().into()
}

/// Decode the return data of a `tokenConfig` view call.
pub fn decode_token_config(token: Address, data: &[u8]) -> Result<TokenAllowlistEntry> {
    let ret = Roulette::tokenConfigCall::abi_decode_returns(data, true)
        .context("Failed to decode tokenConfig return data")?;
    Ok(TokenAllowlistEntry {
        token,
        enabled: ret.enabled,
        min_amount: ret.minAmount,
        max_amount: ret.maxAmount,
    })
}
