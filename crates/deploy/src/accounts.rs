//! Sender account resolution.

use alloy_core::primitives::Address;
use alloy_signer_local::{MnemonicBuilder, coins_bip39::English};
use anyhow::{Context, Result};

/// Derive the address at `index` of the standard derivation path of a BIP-39
/// mnemonic.
///
/// Only the address is used: the node holding the same mnemonic signs.
pub fn sender_from_mnemonic(phrase: &str, index: u32) -> Result<Address> {
    let signer = MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .index(index)
        .context("Invalid derivation index")?
        .build()
        .context("Failed to derive account from mnemonic")?;

    Ok(Address::from(signer.address().into_array()))
}
