//! The shared state every command runs against

use std::path::PathBuf;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, U256},
    providers::{DynProvider, Provider},
};

use crate::{
    artifacts::ContractArtifact,
    chain::RpcChain,
    deployments::read_deployment_address,
    errors::ScriptError,
    retry::RetryPolicy,
    types::Network,
    utils::{fetch_network, parse_address, setup_client, wallet_address},
    verify::EtherscanVerifier,
};

/// The connection, configuration and file locations a command needs
#[derive(Clone)]
pub struct ScriptContext {
    /// The provider, with the deployer's wallet attached
    pub provider: DynProvider,
    /// The deployer's wallet, for signing deployments locally
    pub wallet: EthereumWallet,
    /// The deployer address
    pub deployer: Address,
    /// The network the provider is connected to
    pub network: Network,
    /// The deployments file
    pub deployments_path: PathBuf,
    /// The Hardhat artifacts directory
    pub artifacts_path: PathBuf,
    /// The explorer API key, if verification is enabled
    pub etherscan_api_key: Option<String>,
    /// The number of confirmations to wait for on each deployment
    pub confirmations: u64,
    /// The retry policy for RPC calls
    pub retry: RetryPolicy,
}

/// The settings a [`ScriptContext`] is built from
pub struct ContextConfig<'a> {
    /// Private key of the deployer
    pub priv_key: &'a str,
    /// Network RPC URL
    pub rpc_url: &'a str,
    /// The configured network name
    pub network: &'a str,
    /// The deployments file
    pub deployments_path: PathBuf,
    /// The Hardhat artifacts directory
    pub artifacts_path: PathBuf,
    /// The explorer API key
    pub etherscan_api_key: Option<String>,
    /// The number of confirmations to wait for on each deployment
    pub confirmations: u64,
    /// The retry policy for RPC calls
    pub retry: RetryPolicy,
}

impl ScriptContext {
    /// Connect to the node and resolve the network
    pub async fn new(config: ContextConfig<'_>) -> Result<Self, ScriptError> {
        let (provider, wallet) = setup_client(config.priv_key, config.rpc_url)?;
        let deployer = wallet_address(&wallet);
        let network = fetch_network(&provider, config.network).await?;

        // An empty key from the environment means no key
        let etherscan_api_key = config.etherscan_api_key.filter(|key| !key.is_empty());

        Ok(Self {
            provider,
            wallet,
            deployer,
            network,
            deployments_path: config.deployments_path,
            artifacts_path: config.artifacts_path,
            etherscan_api_key,
            confirmations: config.confirmations,
            retry: config.retry,
        })
    }

    /// A deployment chain client using the context's settings
    pub fn chain(&self) -> RpcChain {
        RpcChain::new(self.provider.clone(), self.wallet.clone())
            .with_confirmations(self.confirmations)
            .with_retry_policy(self.retry)
    }

    /// The explorer verifier, if an API key is configured
    pub fn verifier(&self) -> Result<Option<EtherscanVerifier>, ScriptError> {
        self.etherscan_api_key
            .clone()
            .map(EtherscanVerifier::new)
            .transpose()
    }

    /// Load a compiled contract from the artifacts directory
    pub fn artifact(&self, contract_name: &str) -> Result<ContractArtifact, ScriptError> {
        ContractArtifact::load(&self.artifacts_path, contract_name)
    }

    /// Resolve a contract address, preferring an explicit override over the
    /// deployments file
    pub fn contract_address(
        &self,
        override_addr: Option<&str>,
        contract_name: &str,
    ) -> Result<Address, ScriptError> {
        match override_addr {
            Some(addr) => parse_address(addr),
            None => read_deployment_address(&self.network.name, contract_name, &self.deployments_path),
        }
    }

    /// The deployer's ether balance
    pub async fn deployer_balance(&self) -> Result<U256, ScriptError> {
        self.provider
            .get_balance(self.deployer)
            .await
            .map_err(|e| ScriptError::ChainQuery(e.to_string()))
    }
}
