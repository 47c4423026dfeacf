//! Utilities for the deploy and governance scripts.

use std::str::FromStr;

use alloy::{
    contract::{CallBuilder, CallDecoder, Error as ContractError},
    network::{Ethereum, EthereumWallet, NetworkWallet},
    primitives::{Address, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{json_rpc::ErrorPayload, types::TransactionReceipt},
    signers::local::PrivateKeySigner,
    sol_types::decode_revert_reason,
    transports::RpcError,
};
use reqwest::Url;
use tracing::info;

use crate::{errors::ScriptError, types::Network};

/// The call builder type used by the scripts, over any provider or
/// reference to one
pub type ScriptCallBuilder<P, C> = CallBuilder<P, C, Ethereum>;

/// Sets up the provider used by the scripts, with the deployer's wallet
/// attached, returning it alongside the wallet.
pub fn setup_client(
    priv_key: &str,
    rpc_url: &str,
) -> Result<(DynProvider, EthereumWallet), ScriptError> {
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let wallet = EthereumWallet::from(signer);

    let url = rpc_url
        .parse::<Url>()
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let provider = ProviderBuilder::new().wallet(wallet.clone()).connect_http(url);

    Ok((DynProvider::new(provider), wallet))
}

/// The address a wallet signs with by default
pub fn wallet_address(wallet: &EthereumWallet) -> Address {
    NetworkWallet::<Ethereum>::default_signer_address(wallet)
}

/// Resolve the network the provider is connected to
pub async fn fetch_network(provider: &DynProvider, name: &str) -> Result<Network, ScriptError> {
    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    Ok(Network {
        name: name.to_string(),
        chain_id,
    })
}

/// Parse a hex address given on the command line
pub fn parse_address(addr: &str) -> Result<Address, ScriptError> {
    Address::from_str(addr).map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Extract a human-readable revert reason from an RPC error response
pub fn payload_revert_reason(payload: &ErrorPayload) -> String {
    payload
        .as_revert_data()
        .and_then(|data| decode_revert_reason(&data))
        .unwrap_or_else(|| payload.message.to_string())
}

/// Map a contract call error to a script error, surfacing the revert reason
/// when the node rejected the call
pub fn map_contract_error(err: ContractError) -> ScriptError {
    match err {
        ContractError::TransportError(RpcError::ErrorResp(payload)) => {
            ScriptError::TransactionReverted {
                reason: payload_revert_reason(&payload),
            }
        }
        ContractError::TransportError(e) => ScriptError::ChainQuery(e.to_string()),
        e => ScriptError::ContractInteraction(e.to_string()),
    }
}

/// Send a transaction and wait for it to be mined, failing if it reverted
pub async fn send_tx<P: Provider, C: CallDecoder>(
    tx: ScriptCallBuilder<P, C>,
) -> Result<TransactionReceipt, ScriptError> {
    let pending_tx = tx.send().await.map_err(map_contract_error)?;
    let tx_hash = *pending_tx.tx_hash();

    let receipt = pending_tx
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ChainQuery(e.to_string()))?;
    if !receipt.status() {
        return Err(ScriptError::TransactionReverted {
            reason: format!("tx {tx_hash} reverted"),
        });
    }

    info!("Tx {} mined in block {:?}", tx_hash, receipt.block_number);
    Ok(receipt)
}

/// The ether paid for a mined transaction's gas, zero if there is no receipt
pub fn transaction_cost(receipt: Option<&TransactionReceipt>) -> U256 {
    receipt
        .map(|r| U256::from(r.gas_used) * U256::from(r.effective_gas_price))
        .unwrap_or_default()
}
