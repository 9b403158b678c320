//! Parameter records for the roulette deployment step.
//!
//! Both records are plain values: built once, passed by reference to the
//! sequencer and dropped at the end of the run.

use std::str::FromStr;

use alloy_core::primitives::{Address, U256, address};
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Fee denominator passed to the roulette constructor.
pub const FEE_BASIS_POINTS: u64 = 1078;

/// Beneficiary passed to the roulette constructor.
pub const BENEFICIARY: Address = address!("BbC88aD98b78e1AE8C1449B47D5060AB1D06890D");

/// Token allowlisted right after deployment.
pub const ALLOWLISTED_TOKEN: Address = address!("77c21c770Db1156e271a3516F89380BA53D594FA");

/// Decimal exponent of the minimum wager (`10^18`).
pub const MIN_AMOUNT_EXP: u64 = 18;

/// Decimal exponent of the maximum wager (`10^30`).
pub const MAX_AMOUNT_EXP: u64 = 30;

/// Computes `10^exp` exactly in 256 bits.
pub fn pow10(exp: u64) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

/// Parse a 0x-prefixed, 40 hex char address.
///
/// Mixed-case input is accepted without checksum validation, matching what
/// the node accepts. Used to parse sender overrides given on the command
/// line.
pub fn parse_address(addr: &str) -> anyhow::Result<Address> {
    if !addr.starts_with("0x") || addr.len() != 42 {
        anyhow::bail!(
            "Invalid address format: expected 0x-prefixed 40 hex chars, got '{}'",
            addr
        );
    }

    Address::from_str(addr).with_context(|| format!("Invalid address: '{}'", addr))
}

/// Constructor arguments of the roulette contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentParams {
    /// Fee / odds denominator, in basis points.
    pub fee_basis_points: U256,
    /// Address receiving the house fees.
    pub beneficiary: Address,
}

impl Default for DeploymentParams {
    fn default() -> Self {
        Self {
            fee_basis_points: U256::from(FEE_BASIS_POINTS),
            beneficiary: BENEFICIARY,
        }
    }
}

/// Per-token allowlist configuration applied with `setToken`.
///
/// `min_amount <= max_amount` is left to the contract to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAllowlistEntry {
    /// Token being allow/deny-listed.
    pub token: Address,
    /// Allowlist membership flag.
    pub enabled: bool,
    /// Lower wager bound.
    pub min_amount: U256,
    /// Upper wager bound.
    pub max_amount: U256,
}

impl TokenAllowlistEntry {
    /// The entry a freshly deployed contract reports for an unknown token.
    pub fn absent(token: Address) -> Self {
        Self {
            token,
            enabled: false,
            min_amount: U256::ZERO,
            max_amount: U256::ZERO,
        }
    }
}

impl Default for TokenAllowlistEntry {
    fn default() -> Self {
        Self {
            token: ALLOWLISTED_TOKEN,
            enabled: true,
            min_amount: pow10(MIN_AMOUNT_EXP),
            max_amount: pow10(MAX_AMOUNT_EXP),
        }
    }
}
