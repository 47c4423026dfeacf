//! Tests of the governance scripts against a freshly deployed governor

use alloy::primitives::{utils::parse_ether, Address, U256};
use eyre::{ensure, Result};
use scripts::{
    constants::VOTE_FOR,
    governance::{
        cast_vote, delegate, execute_proposal, proposal_state, submit_proposal, MintProposal,
    },
    solidity::{IGovernor, IVotesToken},
    types::{LinkDirection, ProposalState},
};

use crate::{constants::INITIAL_TOKEN_SUPPLY, integration_test, test_args::TestArgs};

/// The description of the proposal the tests submit
const PROPOSAL_DESCRIPTION: &str = "Give the owner more token";
/// The amount the tests' proposal mints, in whole tokens
const PROPOSAL_MINT_AMOUNT: &str = "2000";

// -----------
// | Helpers |
// -----------

/// A deployed governor and token, with the deployer's votes delegated
struct GovernanceSetup {
    /// The governor address
    governor: Address,
    /// The token address
    token: Address,
    /// A mint proposal to the deployer
    proposal: MintProposal,
}

/// Deploy a governor and token and delegate the deployer's votes to itself
async fn setup(args: &TestArgs) -> Result<GovernanceSetup> {
    let linked = args.deploy_governor(LinkDirection::AThenB).await?;
    let (governor, token) = (linked.address_a(), linked.address_b());
    delegate(&args.provider, token, args.deployer_addr()).await?;

    let proposal = MintProposal {
        token,
        recipient: args.deployer_addr(),
        amount: parse_ether(PROPOSAL_MINT_AMOUNT)?,
        description: PROPOSAL_DESCRIPTION.to_string(),
    };
    Ok(GovernanceSetup {
        governor,
        token,
        proposal,
    })
}

/// Submit the setup's proposal and mine past its voting delay
async fn propose(args: &TestArgs, setup: &GovernanceSetup) -> Result<U256> {
    let proposal_id = submit_proposal(&args.provider, setup.governor, &setup.proposal).await?;
    args.mine().await?;
    Ok(proposal_id)
}

// ---------
// | Tests |
// ---------

/// Test that the deployer holds the initial supply
async fn test_deployer_holds_initial_supply(args: TestArgs) -> Result<()> {
    let setup = setup(&args).await?;
    let token = IVotesToken::new(setup.token, &args.provider);

    let balance = token.balanceOf(args.deployer_addr()).call().await?;
    ensure!(balance == parse_ether(INITIAL_TOKEN_SUPPLY)?, "unexpected balance {balance}");
    Ok(())
}
integration_test!(test_deployer_holds_initial_supply);

/// Test that a new proposal is pending, and carries the locally computed ID
async fn test_new_proposal_is_pending(args: TestArgs) -> Result<()> {
    let setup = setup(&args).await?;
    let proposal_id = propose(&args, &setup).await?;

    ensure!(proposal_id == setup.proposal.proposal_id(), "unexpected proposal ID");

    let governor = IGovernor::new(setup.governor, &args.provider);
    let onchain_id = governor
        .hashProposal(
            setup.proposal.targets(),
            setup.proposal.values(),
            setup.proposal.calldatas(),
            setup.proposal.description_hash(),
        )
        .call()
        .await?;
    ensure!(onchain_id == proposal_id, "governor hashes the proposal differently");

    let state = proposal_state(&args.provider, setup.governor, proposal_id).await?;
    ensure!(state == ProposalState::Pending, "expected Pending, got {state}");
    Ok(())
}
integration_test!(test_new_proposal_is_pending);

/// Test that a vote is cast with the deployer's delegated weight
async fn test_vote_reports_weight(args: TestArgs) -> Result<()> {
    let setup = setup(&args).await?;
    let proposal_id = propose(&args, &setup).await?;

    let vote = cast_vote(&args.provider, setup.governor, proposal_id, VOTE_FOR).await?;
    ensure!(vote.voter == args.deployer_addr(), "vote attributed to {:#x}", vote.voter);
    ensure!(vote.proposalId == proposal_id, "vote cast on the wrong proposal");
    ensure!(vote.support == VOTE_FOR, "vote cast against");
    ensure!(
        vote.weight == parse_ether(INITIAL_TOKEN_SUPPLY)?,
        "unexpected vote weight {}",
        vote.weight
    );
    Ok(())
}
integration_test!(test_vote_reports_weight);

/// Test that executing the passed proposal mints to the recipient
async fn test_execute_mints_tokens(args: TestArgs) -> Result<()> {
    let setup = setup(&args).await?;
    let proposal_id = propose(&args, &setup).await?;
    cast_vote(&args.provider, setup.governor, proposal_id, VOTE_FOR).await?;
    args.mine().await?;

    let executed_id = execute_proposal(&args.provider, setup.governor, &setup.proposal).await?;
    ensure!(executed_id == proposal_id, "executed the wrong proposal");

    let token = IVotesToken::new(setup.token, &args.provider);
    let balance = token.balanceOf(args.deployer_addr()).call().await?;
    let expected = parse_ether(INITIAL_TOKEN_SUPPLY)? + setup.proposal.amount;
    ensure!(balance == expected, "expected balance {expected}, got {balance}");

    let state = proposal_state(&args.provider, setup.governor, proposal_id).await?;
    ensure!(state == ProposalState::Executed, "expected Executed, got {state}");
    Ok(())
}
integration_test!(test_execute_mints_tokens);
