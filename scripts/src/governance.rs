//! Governance scripts: delegating votes, and proposing, voting on and
//! executing a token mint through the governor

use alloy::{
    primitives::{keccak256, Address, Bytes, B256, U256},
    providers::DynProvider,
    rpc::types::TransactionReceipt,
    sol_types::{SolCall, SolEvent, SolValue},
};
use tracing::info;

use crate::{
    errors::ScriptError,
    solidity::{IGovernor, IVotesToken},
    types::ProposalState,
    utils::{map_contract_error, send_tx},
};

/// A proposal that mints governance tokens to a recipient
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintProposal {
    /// The token contract, the proposal's only target
    pub token: Address,
    /// Who receives the minted tokens
    pub recipient: Address,
    /// The amount to mint, in the token's base units
    pub amount: U256,
    /// The proposal description, hashed to identify the proposal on execution
    pub description: String,
}

impl MintProposal {
    /// The contracts the proposal calls
    pub fn targets(&self) -> Vec<Address> {
        vec![self.token]
    }

    /// The ether sent with each call
    pub fn values(&self) -> Vec<U256> {
        vec![U256::ZERO]
    }

    /// The calldata of each call
    pub fn calldatas(&self) -> Vec<Bytes> {
        let mint = IVotesToken::mintCall {
            to: self.recipient,
            amount: self.amount,
        };
        vec![mint.abi_encode().into()]
    }

    /// The hash of the description, as `execute` expects it
    pub fn description_hash(&self) -> B256 {
        keccak256(self.description.as_bytes())
    }

    /// The proposal ID the governor assigns, `hashProposal` computed locally
    pub fn proposal_id(&self) -> U256 {
        let encoded = (
            self.targets(),
            self.values(),
            self.calldatas(),
            self.description_hash(),
        )
            .abi_encode_params();
        U256::from_be_bytes(keccak256(encoded).0)
    }
}

/// Find the first log in the receipt that decodes as `E`
pub fn find_event<E: SolEvent>(receipt: &TransactionReceipt) -> Result<E, ScriptError> {
    receipt
        .inner
        .logs()
        .iter()
        .find_map(|log| log.log_decode::<E>().ok())
        .map(|log| log.inner.data)
        .ok_or_else(|| ScriptError::EventNotFound(E::SIGNATURE.to_string()))
}

/// Delegate the signer's voting power on `token` to `delegatee`
pub async fn delegate(
    provider: &DynProvider,
    token: Address,
    delegatee: Address,
) -> Result<TransactionReceipt, ScriptError> {
    let token = IVotesToken::new(token, provider);
    let receipt = send_tx(token.delegate(delegatee)).await?;
    info!("Delegated voting power to {:#x}", delegatee);
    Ok(receipt)
}

/// Submit the proposal, returning its ID from the `ProposalCreated` event
pub async fn submit_proposal(
    provider: &DynProvider,
    governor: Address,
    proposal: &MintProposal,
) -> Result<U256, ScriptError> {
    let governor = IGovernor::new(governor, provider);
    let receipt = send_tx(governor.propose(
        proposal.targets(),
        proposal.values(),
        proposal.calldatas(),
        proposal.description.clone(),
    ))
    .await?;

    let created = find_event::<IGovernor::ProposalCreated>(&receipt)?;
    info!("Proposal {} created", created.proposalId);
    Ok(created.proposalId)
}

/// Cast the signer's vote, returning the `VoteCast` event
pub async fn cast_vote(
    provider: &DynProvider,
    governor: Address,
    proposal_id: U256,
    support: u8,
) -> Result<IGovernor::VoteCast, ScriptError> {
    let governor = IGovernor::new(governor, provider);
    let receipt = send_tx(governor.castVote(proposal_id, support)).await?;

    let vote = find_event::<IGovernor::VoteCast>(&receipt)?;
    info!(
        "proposalId: {}, voter: {:#x}, support: {}, weight: {}",
        vote.proposalId, vote.voter, vote.support, vote.weight
    );
    Ok(vote)
}

/// Execute the proposal, returning the ID from the `ProposalExecuted` event
pub async fn execute_proposal(
    provider: &DynProvider,
    governor: Address,
    proposal: &MintProposal,
) -> Result<U256, ScriptError> {
    let governor = IGovernor::new(governor, provider);
    let receipt = send_tx(governor.execute(
        proposal.targets(),
        proposal.values(),
        proposal.calldatas(),
        proposal.description_hash(),
    ))
    .await?;

    let executed = find_event::<IGovernor::ProposalExecuted>(&receipt)?;
    info!("Proposal {} executed", executed.proposalId);
    Ok(executed.proposalId)
}

/// Read the state of a proposal
pub async fn proposal_state(
    provider: &DynProvider,
    governor: Address,
    proposal_id: U256,
) -> Result<ProposalState, ScriptError> {
    let governor = IGovernor::new(governor, provider);
    let state = governor
        .state(proposal_id)
        .call()
        .await
        .map_err(map_contract_error)?;

    ProposalState::try_from(state).map_err(|s| {
        ScriptError::ContractInteraction(format!("unknown proposal state {s}"))
    })
}
