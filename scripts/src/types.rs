//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::{Address, Bytes};
use clap::ValueEnum;

use crate::constants::{DEVELOPMENT_CHAIN_IDS, DEVELOPMENT_NETWORKS};

/// A compiled contract, ready to be deployed
#[derive(Clone, Debug)]
pub struct ContractSpec {
    /// The contract name, used in logs and as the deployments key
    pub name: String,
    /// The contract creation code, without constructor arguments
    pub bytecode: Bytes,
    /// An explicit gas limit for the creation transaction, if the
    /// node's estimate should not be used
    pub gas_limit: Option<u64>,
}

impl ContractSpec {
    /// Build a spec with no gas limit override
    pub fn new(name: impl Into<String>, bytecode: Bytes) -> Self {
        Self {
            name: name.into(),
            bytecode,
            gas_limit: None,
        }
    }

    /// Override the gas limit of the creation transaction
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// The creation code followed by the encoded constructor arguments
    pub fn init_code(&self, constructor_args: &[u8]) -> Bytes {
        let mut code = Vec::with_capacity(self.bytecode.len() + constructor_args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(constructor_args);
        code.into()
    }
}

/// Which contract of a linked pair is deployed first.
///
/// The first contract is constructed with the *predicted* address of the
/// second; the second is constructed with the *real* address of the first.
#[derive(ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LinkDirection {
    /// Deploy contract A, then contract B
    #[default]
    AThenB,
    /// Deploy contract B, then contract A
    BThenA,
}

impl Display for LinkDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkDirection::AThenB => write!(f, "a-then-b"),
            LinkDirection::BThenA => write!(f, "b-then-a"),
        }
    }
}

/// A contract realised on chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployedContract {
    /// The contract name
    pub name: String,
    /// The address the chain assigned to the contract
    pub address: Address,
    /// The deployer nonce of the creation transaction
    pub nonce: u64,
    /// The ABI-encoded constructor arguments
    pub constructor_args: Bytes,
}

/// The result of deploying two mutually-referencing contracts
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedDeployment {
    /// The deployment of contract A
    pub contract_a: DeployedContract,
    /// The deployment of contract B
    pub contract_b: DeployedContract,
}

impl LinkedDeployment {
    /// The real address of contract A
    pub fn address_a(&self) -> Address {
        self.contract_a.address
    }

    /// The real address of contract B
    pub fn address_b(&self) -> Address {
        self.contract_b.address
    }
}

/// The network the scripts are pointed at
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    /// The configured network name
    pub name: String,
    /// The chain ID reported by the RPC endpoint
    pub chain_id: u64,
}

impl Network {
    /// Whether the network is a local development chain
    pub fn is_development(&self) -> bool {
        DEVELOPMENT_NETWORKS.contains(&self.name.as_str())
            || DEVELOPMENT_CHAIN_IDS.contains(&self.chain_id)
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (chain {})", self.name, self.chain_id)
    }
}

/// The lifecycle state of a governor proposal, in the governor's enum order
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProposalState {
    /// Created, voting has not started
    Pending,
    /// Voting is open
    Active,
    /// Cancelled by the proposer
    Canceled,
    /// Voting closed without reaching quorum or majority
    Defeated,
    /// Voting closed in favour
    Succeeded,
    /// Queued in a timelock
    Queued,
    /// Not executed before its deadline
    Expired,
    /// Executed
    Executed,
}

impl TryFrom<u8> for ProposalState {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => ProposalState::Pending,
            1 => ProposalState::Active,
            2 => ProposalState::Canceled,
            3 => ProposalState::Defeated,
            4 => ProposalState::Succeeded,
            5 => ProposalState::Queued,
            6 => ProposalState::Expired,
            7 => ProposalState::Executed,
            other => return Err(other),
        })
    }
}

impl Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
