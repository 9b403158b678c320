//! Shared RPC utilities for interacting with Ethereum JSON-RPC endpoints.

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    time::Duration,
};

use alloy_core::primitives::{Address, B256, U64};
use anyhow::Context;
use backon::{ConstantBuilder, Retryable};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

/// Default timeout for RPC requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client(timeout: Duration) -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error response.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    tracing::debug!(method, "JSON-RPC request");

    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    if let Some(error) = result.get("error") {
        anyhow::bail!(
            "RPC error: {}",
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = result
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// Receipt of a mined transaction, as returned by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Hash of the transaction.
    pub transaction_hash: B256,
    /// Block the transaction was included in.
    #[serde(default)]
    pub block_number: Option<U64>,
    /// Address of the created contract, for contract-creation transactions.
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// `1` on success, `0` on revert.
    #[serde(default)]
    pub status: Option<U64>,
}

impl TransactionReceipt {
    /// Whether the transaction executed without reverting.
    ///
    /// Receipts without a status field predate EIP-658 and carry no revert
    /// information.
    pub fn succeeded(&self) -> bool {
        self.status != Some(U64::ZERO)
    }
}

/// How long to wait for a transaction to be mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Interval between two receipt lookups.
    pub poll_interval: Duration,
    /// Give up after this long.
    pub timeout: Duration,
}

impl ConfirmationPolicy {
    /// Number of lookups allowed within the timeout, the first one excluded.
    fn max_polls(&self) -> usize {
        let interval = self.poll_interval.as_millis().max(1);
        (self.timeout.as_millis() / interval) as usize
    }
}

/// The receipt of a transaction is not available yet.
#[derive(Debug)]
struct ReceiptPending(B256);

impl Display for ReceiptPending {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "transaction {} is not mined yet", self.0)
    }
}

impl Error for ReceiptPending {}

/// Whether a receipt lookup failure is worth another attempt.
///
/// A pending receipt and transport failures are. JSON-RPC errors returned by
/// the node are not.
fn is_retryable(e: &anyhow::Error) -> bool {
    e.is::<ReceiptPending>() || e.chain().any(|cause| cause.is::<reqwest::Error>())
}

/// Poll `eth_getTransactionReceipt` until the transaction is mined.
///
/// A missing receipt and transport errors are retried until the policy
/// timeout. JSON-RPC errors abort immediately.
pub async fn wait_for_receipt(
    client: &reqwest::Client,
    url: &str,
    tx_hash: B256,
    policy: ConfirmationPolicy,
) -> Result<TransactionReceipt, anyhow::Error> {
    let backoff = ConstantBuilder::default()
        .with_delay(policy.poll_interval)
        .with_max_times(policy.max_polls());

    let fetch = move || async move {
        let receipt: Option<TransactionReceipt> = json_rpc_call(
            client,
            url,
            "eth_getTransactionReceipt",
            vec![serde_json::json!(tx_hash)],
        )
        .await?;
        receipt.ok_or_else(|| anyhow::Error::new(ReceiptPending(tx_hash)))
    };

    let timeout_message = || {
        format!(
            "Timeout waiting for transaction {} to be mined after {}s",
            tx_hash,
            policy.timeout.as_secs()
        )
    };

    fetch
        .retry(backoff)
        .when(is_retryable)
        .notify(|e, after| {
            if e.is::<ReceiptPending>() {
                tracing::trace!(tx_hash = %tx_hash, ?after, "Receipt not available, polling again...");
            } else {
                tracing::warn!(tx_hash = %tx_hash, ?after, error = %e, "Receipt lookup failed, retrying...");
            }
        })
        .await
        .map_err(|e| {
            if e.is::<ReceiptPending>() {
                anyhow::anyhow!(timeout_message())
            } else if is_retryable(&e) {
                e.context(timeout_message())
            } else {
                e
            }
        })
}
