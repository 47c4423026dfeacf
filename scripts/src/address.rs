//! Deterministic precomputation of contract creation addresses

use alloy::primitives::Address;
use tracing::info;

use crate::{chain::DeployChain, errors::ScriptError};

/// Predict the address of the contract created by `sender`'s transaction at
/// nonce `current_nonce + offset`.
///
/// This is the `CREATE` derivation: the last 20 bytes of
/// `keccak256(rlp([sender, nonce]))`. The prediction only holds if exactly
/// `offset` transactions from `sender` land between the nonce read and the
/// deployment. Reverted transactions still consume a nonce.
pub fn predict_contract_address(
    sender: Address,
    current_nonce: u64,
    offset: u64,
) -> Result<Address, ScriptError> {
    let nonce = current_nonce
        .checked_add(offset)
        .ok_or(ScriptError::NonceOverflow)?;
    Ok(sender.create(nonce))
}

/// Read the deployer's current nonce and predict the address created
/// `offset` transactions from now.
///
/// Returns the nonce that was read alongside the prediction.
pub async fn fetch_and_predict(
    chain: &impl DeployChain,
    offset: u64,
) -> Result<(u64, Address), ScriptError> {
    let deployer = chain.deployer();
    let nonce = chain.transaction_count().await?;
    let predicted = predict_contract_address(deployer, nonce, offset)?;

    info!(
        "Deployer {:#x} at nonce {}, creation at offset {} lands at {:#x}",
        deployer, nonce, offset, predicted
    );
    Ok((nonce, predicted))
}
