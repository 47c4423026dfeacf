//! Defines arguments passed to each test

use std::{path::PathBuf, str::FromStr};

use alloy::{
    network::EthereumWallet,
    primitives::{Address, U256},
    providers::{ext::AnvilApi, DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use eyre::{eyre, Result};
use scripts::{
    artifacts::ContractArtifact,
    chain::RpcChain,
    constants::{
        CROWDFUNDING_CONTRACT_NAME, GOVERNOR_CONTRACT_NAME, GOVERNOR_GAS_LIMIT,
        TOKEN_CONTRACT_NAME,
    },
    deploy::{deploy_contract, deploy_linked_pair},
    types::{ContractSpec, LinkDirection, LinkedDeployment},
};

use crate::{constants::ACCOUNT_PKEYS, CliArgs};

/// The arguments provided to each integration test
#[derive(Clone)]
pub(crate) struct TestArgs {
    /// The RPC url of the node
    pub rpc_url: Url,
    /// The Hardhat artifacts directory
    pub artifacts: PathBuf,
    /// The deployer's signer
    pub deployer: PrivateKeySigner,
    /// A provider signing with the deployer's key
    pub provider: DynProvider,
    /// Signers for the other funded accounts
    pub accounts: Vec<PrivateKeySigner>,
}

impl TestArgs {
    /// Build the test arguments from the CLI arguments
    pub fn new(args: &CliArgs) -> Result<Self> {
        let rpc_url = Url::parse(&args.rpc_url)?;
        let deployer = PrivateKeySigner::from_str(&args.pkey)?;
        let provider = setup_wallet(&rpc_url, deployer.clone());

        let accounts = ACCOUNT_PKEYS
            .iter()
            .map(|pkey| PrivateKeySigner::from_str(pkey))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rpc_url,
            artifacts: args.artifacts.clone(),
            deployer,
            provider,
            accounts,
        })
    }

    // --- Accounts --- //

    /// The deployer's address
    pub fn deployer_addr(&self) -> Address {
        self.deployer.address()
    }

    /// The address of the `idx`th non-deployer account
    pub fn account_addr(&self, idx: usize) -> Result<Address> {
        self.account(idx).map(|signer| signer.address())
    }

    /// A provider signing with the `idx`th non-deployer account
    pub fn account_provider(&self, idx: usize) -> Result<DynProvider> {
        let signer = self.account(idx)?.clone();
        Ok(setup_wallet(&self.rpc_url, signer))
    }

    /// The signer of the `idx`th non-deployer account
    fn account(&self, idx: usize) -> Result<&PrivateKeySigner> {
        self.accounts
            .get(idx)
            .ok_or_else(|| eyre!("only {} test accounts configured", self.accounts.len()))
    }

    /// The ether balance of an address
    pub async fn balance(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address).await?)
    }

    /// Mine a block
    pub async fn mine(&self) -> Result<()> {
        self.provider.evm_mine(None).await?;
        Ok(())
    }

    // --- Deployments --- //

    /// A deployment chain client for the deployer
    pub fn chain(&self) -> RpcChain {
        RpcChain::new(self.provider.clone(), EthereumWallet::from(self.deployer.clone()))
    }

    /// Load a contract from the artifacts directory
    pub fn contract_spec(&self, name: &str) -> Result<ContractSpec> {
        Ok(ContractArtifact::load(&self.artifacts, name)?.spec())
    }

    /// Deploy a fresh governor and token, `contract_a` being the governor
    pub async fn deploy_governor(&self, direction: LinkDirection) -> Result<LinkedDeployment> {
        let governor = self
            .contract_spec(GOVERNOR_CONTRACT_NAME)?
            .with_gas_limit(GOVERNOR_GAS_LIMIT);
        let token = self.contract_spec(TOKEN_CONTRACT_NAME)?;

        Ok(deploy_linked_pair(&self.chain(), &governor, &token, direction, |_| Ok(())).await?)
    }

    /// Deploy a fresh crowdfunding contract, returning its address
    pub async fn deploy_crowdfunding(&self) -> Result<Address> {
        let spec = self.contract_spec(CROWDFUNDING_CONTRACT_NAME)?;
        let deployed = deploy_contract(&self.chain(), &spec, Default::default()).await?;
        Ok(deployed.address)
    }
}

/// Setup a provider for tests
fn setup_wallet(rpc_url: &Url, signer: PrivateKeySigner) -> DynProvider {
    let provider = ProviderBuilder::new()
        .wallet(signer)
        .connect_http(rpc_url.clone());
    DynProvider::new(provider)
}
