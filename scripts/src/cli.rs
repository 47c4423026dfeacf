//! Definitions of CLI arguments and commands for the deploy and governance
//! scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{
        cast_vote_cmd, delegate_cmd, deploy_crowdfunding, deploy_governor, execute_proposal_cmd,
        predict_address, proposal_state_cmd, submit_proposal_cmd, verify_governor,
    },
    constants::{
        CROWDFUNDING_CONTRACT_NAME, DEFAULT_ARTIFACTS_PATH, DEFAULT_DEPLOYMENTS_PATH,
        DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_RETRIES, DEFAULT_NETWORK,
        DEFAULT_PROPOSAL_DESCRIPTION, DEFAULT_PROPOSAL_MINT_AMOUNT, DEFAULT_RPC_URL,
        GOVERNOR_CONTRACT_NAME, GOVERNOR_GAS_LIMIT, NUM_DEPLOY_CONFIRMATIONS,
        TOKEN_CONTRACT_NAME, VOTE_FOR,
    },
    context::ScriptContext,
    errors::ScriptError,
    types::LinkDirection,
};

/// Deploy the governance and crowdfunding contracts, and drive governance
/// proposals through their lifecycle
#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(short, long, env = "PKEY")]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Name of the target network, development networks skip verification
    #[arg(short, long, env = "NETWORK", default_value = DEFAULT_NETWORK)]
    pub network: String,

    /// Etherscan API key, verification is skipped without one
    #[arg(long, env = "ETHERSCAN_API_KEY")]
    pub etherscan_api_key: Option<String>,

    /// Path to a `deployments.json` file
    #[arg(short, long, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: PathBuf,

    /// Path to the Hardhat artifacts directory
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_PATH)]
    pub artifacts: PathBuf,

    /// Confirmations to wait for on each deployment
    #[arg(long, default_value_t = NUM_DEPLOY_CONFIRMATIONS)]
    pub confirmations: u64,

    /// Attempts made for each RPC call before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Backoff after the first failed RPC call, doubled on each retry
    #[arg(long, default_value_t = DEFAULT_INITIAL_BACKOFF_MS)]
    pub initial_backoff_ms: u64,

    /// The script to run
    #[command(subcommand)]
    pub command: Command,
}

/// The scripts
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the governor and token as a linked pair
    DeployGovernor(DeployGovernorArgs),
    /// Deploy the crowdfunding contract
    DeployCrowdfunding(DeployCrowdfundingArgs),
    /// Verify the deployed governor and token
    Verify(VerifyArgs),
    /// Delegate voting power
    Delegate(DelegateArgs),
    /// Propose a token mint
    SubmitProposal(ProposalArgs),
    /// Vote on a proposal
    CastVote(CastVoteArgs),
    /// Execute a passed mint proposal
    ExecuteProposal(ProposalArgs),
    /// Print a proposal's state
    ProposalState(ProposalStateArgs),
    /// Print a predicted creation address
    PredictAddress(PredictAddressArgs),
}

impl Command {
    /// Run the script against the given context
    pub async fn run(self, ctx: &ScriptContext) -> Result<(), ScriptError> {
        match self {
            Command::DeployGovernor(args) => deploy_governor(args, ctx).await,
            Command::DeployCrowdfunding(args) => deploy_crowdfunding(args, ctx).await,
            Command::Verify(args) => verify_governor(args, ctx).await,
            Command::Delegate(args) => delegate_cmd(args, ctx).await,
            Command::SubmitProposal(args) => submit_proposal_cmd(args, ctx).await,
            Command::CastVote(args) => cast_vote_cmd(args, ctx).await,
            Command::ExecuteProposal(args) => execute_proposal_cmd(args, ctx).await,
            Command::ProposalState(args) => proposal_state_cmd(args, ctx).await,
            Command::PredictAddress(args) => predict_address(args, ctx).await,
        }
    }
}

/// Deploy the governor and its token, each constructed with the other's
/// address.
///
/// The first contract is given the predicted address of the second, so no
/// other transaction may be sent from the deployer while this runs.
#[derive(Args)]
pub struct DeployGovernorArgs {
    /// Which contract goes first, `a` being the governor
    #[arg(long, value_enum, default_value_t = LinkDirection::AThenB)]
    pub direction: LinkDirection,

    /// Name of the governor contract artifact
    #[arg(long, default_value = GOVERNOR_CONTRACT_NAME)]
    pub governor: String,

    /// Name of the token contract artifact
    #[arg(long, default_value = TOKEN_CONTRACT_NAME)]
    pub token: String,

    /// Gas limit for the governor's creation transaction
    #[arg(long, default_value_t = GOVERNOR_GAS_LIMIT)]
    pub governor_gas_limit: u64,

    /// Deploy only the second contract, linking it to the first contract
    /// recorded in the deployments file
    #[arg(long)]
    pub resume: bool,

    /// Do not verify the contracts, even on a public network
    #[arg(long)]
    pub skip_verification: bool,
}

/// Deploy the crowdfunding contract
#[derive(Args)]
pub struct DeployCrowdfundingArgs {
    /// Name of the crowdfunding contract artifact
    #[arg(long, default_value = CROWDFUNDING_CONTRACT_NAME)]
    pub contract_name: String,

    /// Do not verify the contract, even on a public network
    #[arg(long)]
    pub skip_verification: bool,
}

/// Verify the recorded governor and token, each with the other's address as
/// its constructor argument
#[derive(Args)]
pub struct VerifyArgs {
    /// Name of the governor contract
    #[arg(long, default_value = GOVERNOR_CONTRACT_NAME)]
    pub governor: String,

    /// Name of the token contract
    #[arg(long, default_value = TOKEN_CONTRACT_NAME)]
    pub token: String,
}

/// Delegate the deployer's voting power
#[derive(Args)]
pub struct DelegateArgs {
    /// Token address in hex, read from the deployments file if omitted
    #[arg(long)]
    pub token_address: Option<String>,

    /// Delegatee address in hex, the deployer if omitted
    #[arg(long)]
    pub delegatee: Option<String>,
}

/// A proposal minting tokens to a recipient
#[derive(Args)]
pub struct ProposalArgs {
    /// Governor address in hex, read from the deployments file if omitted
    #[arg(long)]
    pub governor_address: Option<String>,

    /// Token address in hex, read from the deployments file if omitted
    #[arg(long)]
    pub token_address: Option<String>,

    /// Recipient of the minted tokens in hex, the deployer if omitted
    #[arg(long)]
    pub recipient: Option<String>,

    /// Amount to mint, in whole tokens
    #[arg(long, default_value = DEFAULT_PROPOSAL_MINT_AMOUNT)]
    pub amount: String,

    /// The proposal description
    #[arg(long, default_value = DEFAULT_PROPOSAL_DESCRIPTION)]
    pub description: String,
}

/// Vote on a proposal
#[derive(Args)]
pub struct CastVoteArgs {
    /// The proposal ID, in decimal
    #[arg(long)]
    pub proposal_id: String,

    /// 0 against, 1 for, 2 abstain
    #[arg(long, default_value_t = VOTE_FOR)]
    pub support: u8,

    /// Governor address in hex, read from the deployments file if omitted
    #[arg(long)]
    pub governor_address: Option<String>,
}

/// Print the state of a proposal
#[derive(Args)]
pub struct ProposalStateArgs {
    /// The proposal ID, in decimal
    #[arg(long)]
    pub proposal_id: String,

    /// Governor address in hex, read from the deployments file if omitted
    #[arg(long)]
    pub governor_address: Option<String>,
}

/// Print the address of the contract the deployer would create `offset`
/// transactions from now
#[derive(Args)]
pub struct PredictAddressArgs {
    /// Number of deployer transactions before the creation
    #[arg(long, default_value_t = 0)]
    pub offset: u64,
}
