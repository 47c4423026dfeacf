//! Implementations of the deploy and governance scripts

use std::str::FromStr;

use alloy::primitives::{
    utils::{format_ether, parse_ether},
    Address, Bytes, U256,
};
use tracing::{error, info, warn};

use crate::{
    address::fetch_and_predict,
    artifacts::ContractArtifact,
    cli::{
        CastVoteArgs, DelegateArgs, DeployCrowdfundingArgs, DeployGovernorArgs, PredictAddressArgs,
        ProposalArgs, ProposalStateArgs, VerifyArgs,
    },
    constants::{GOVERNOR_CONTRACT_NAME, TOKEN_CONTRACT_NAME},
    context::ScriptContext,
    deploy::{deploy_contract, deploy_linked_pair, deploy_linked_second},
    deployments::{read_deployed_contract, write_deployment},
    errors::ScriptError,
    governance::{
        cast_vote, delegate, execute_proposal, proposal_state, submit_proposal, MintProposal,
    },
    solidity::{IGovernor, IVotesToken},
    types::{DeployedContract, LinkDirection},
    utils::{map_contract_error, parse_address},
    verify::{verify_if_public, EtherscanVerifier},
};

// --------------
// | Deployment |
// --------------

/// Deploy the governor and token as a linked pair, record both and verify
/// them on public networks
pub async fn deploy_governor(args: DeployGovernorArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let governor_artifact = ctx.artifact(&args.governor)?;
    let token_artifact = ctx.artifact(&args.token)?;
    let governor_spec = governor_artifact.spec().with_gas_limit(args.governor_gas_limit);
    let token_spec = token_artifact.spec();
    log_deployer(ctx).await?;

    let chain = ctx.chain();
    let (governor, token) = if args.resume {
        let (first_spec, second_spec) = match args.direction {
            LinkDirection::AThenB => (&governor_spec, &token_spec),
            LinkDirection::BThenA => (&token_spec, &governor_spec),
        };
        let first =
            read_deployed_contract(&ctx.network.name, &first_spec.name, &ctx.deployments_path)?;
        info!(
            "Resuming from {} at {:#x} (nonce {})",
            first.name, first.address, first.nonce
        );

        let second = deploy_linked_second(&chain, &first, second_spec).await?;
        write_deployment(&ctx.network.name, &second, &ctx.deployments_path)?;
        match args.direction {
            LinkDirection::AThenB => (first, second),
            LinkDirection::BThenA => (second, first),
        }
    } else {
        // Each contract is recorded once confirmed, so a failed second
        // deployment can be resumed
        let linked = deploy_linked_pair(
            &chain,
            &governor_spec,
            &token_spec,
            args.direction,
            |deployed| write_deployment(&ctx.network.name, deployed, &ctx.deployments_path),
        )
        .await?;
        (linked.contract_a, linked.contract_b)
    };

    info!(
        "governor {:#x}, token {:#x} on {}",
        governor.address, token.address, ctx.network
    );

    if !args.skip_verification {
        let verifier = ctx.verifier()?;
        verify_deployment(ctx, verifier.as_ref(), &governor_artifact, &governor).await;
        verify_deployment(ctx, verifier.as_ref(), &token_artifact, &token).await;
    }
    Ok(())
}

/// Deploy the crowdfunding contract, record it and verify it on public
/// networks
pub async fn deploy_crowdfunding(
    args: DeployCrowdfundingArgs,
    ctx: &ScriptContext,
) -> Result<(), ScriptError> {
    let artifact = ctx.artifact(&args.contract_name)?;
    log_deployer(ctx).await?;
    let deployed = deploy_contract(&ctx.chain(), &artifact.spec(), Bytes::new()).await?;
    write_deployment(&ctx.network.name, &deployed, &ctx.deployments_path)?;

    if !args.skip_verification {
        let verifier = ctx.verifier()?;
        verify_deployment(ctx, verifier.as_ref(), &artifact, &deployed).await;
    }
    Ok(())
}

/// Re-verify the recorded governor and token
pub async fn verify_governor(args: VerifyArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let verifier = ctx.verifier()?;
    for name in [&args.token, &args.governor] {
        let artifact = ctx.artifact(name)?;
        let deployed = read_deployed_contract(&ctx.network.name, name, &ctx.deployments_path)?;
        verify_deployment(ctx, verifier.as_ref(), &artifact, &deployed).await;
    }
    Ok(())
}

/// Print the address the deployer would create `offset` transactions from now
pub async fn predict_address(args: PredictAddressArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let (nonce, predicted) = fetch_and_predict(&ctx.chain(), args.offset).await?;
    info!("nonce {} + {} -> {:#x}", nonce, args.offset, predicted);
    println!("{predicted:#x}");
    Ok(())
}

/// Log the deployer and its balance before deploying
async fn log_deployer(ctx: &ScriptContext) -> Result<(), ScriptError> {
    let balance = ctx.deployer_balance().await?;
    info!(
        "Deploying from {:#x} on {} with balance {}",
        ctx.deployer,
        ctx.network,
        format_ether(balance)
    );
    Ok(())
}

/// Verify a deployment, logging rather than returning any failure
async fn verify_deployment(
    ctx: &ScriptContext,
    verifier: Option<&EtherscanVerifier>,
    artifact: &ContractArtifact,
    deployed: &DeployedContract,
) {
    let request = match artifact.verification_request(deployed.address, deployed.constructor_args.clone()) {
        Ok(request) => request,
        Err(e) => {
            error!("Cannot build verification request for {}: {}", deployed.name, e);
            return;
        }
    };

    verify_if_public(verifier, &ctx.network, &request).await;
}

// --------------
// | Governance |
// --------------

/// Delegate the deployer's voting power. A failure is reported, not fatal.
pub async fn delegate_cmd(args: DelegateArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let token = ctx.contract_address(args.token_address.as_deref(), TOKEN_CONTRACT_NAME)?;
    let delegatee = match args.delegatee {
        Some(addr) => parse_address(&addr)?,
        None => ctx.deployer,
    };

    info!("Delegate voting power to {:#x}", delegatee);
    if let Err(e) = delegate(&ctx.provider, token, delegatee).await {
        error!("Delegation failed: {}", e);
        return Ok(());
    }

    let votes = IVotesToken::new(token, &ctx.provider)
        .getVotes(delegatee)
        .call()
        .await
        .map_err(map_contract_error)?;
    info!("{:#x} now has {} votes", delegatee, format_ether(votes));
    Ok(())
}

/// Propose minting tokens to the recipient
pub async fn submit_proposal_cmd(args: ProposalArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let (governor, proposal) = mint_proposal(args, ctx)?;
    let governor_contract = IGovernor::new(governor, &ctx.provider);
    let delay = governor_contract.votingDelay().call().await.map_err(map_contract_error)?;
    let period = governor_contract.votingPeriod().call().await.map_err(map_contract_error)?;
    info!("Voting opens after {} blocks and lasts {} blocks", delay, period);

    let proposal_id = submit_proposal(&ctx.provider, governor, &proposal).await?;

    if proposal_id != proposal.proposal_id() {
        warn!("Governor assigned an unexpected proposal ID");
    }
    println!("{proposal_id}");
    Ok(())
}

/// Vote on a proposal
pub async fn cast_vote_cmd(args: CastVoteArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let governor = ctx.contract_address(args.governor_address.as_deref(), GOVERNOR_CONTRACT_NAME)?;
    let proposal_id = parse_proposal_id(&args.proposal_id)?;

    let vote = cast_vote(&ctx.provider, governor, proposal_id, args.support).await?;
    println!(
        "proposalId: {}\nvoter: {:#x}\nsupport: {}\nweight: {}",
        vote.proposalId, vote.voter, vote.support, vote.weight
    );
    Ok(())
}

/// Execute a passed mint proposal
pub async fn execute_proposal_cmd(args: ProposalArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let (governor, proposal) = mint_proposal(args, ctx)?;
    let proposal_id = execute_proposal(&ctx.provider, governor, &proposal).await?;
    println!("Proposal {proposal_id} executed");
    Ok(())
}

/// Print the state of a proposal
pub async fn proposal_state_cmd(args: ProposalStateArgs, ctx: &ScriptContext) -> Result<(), ScriptError> {
    let governor = ctx.contract_address(args.governor_address.as_deref(), GOVERNOR_CONTRACT_NAME)?;
    let proposal_id = parse_proposal_id(&args.proposal_id)?;

    let state = proposal_state(&ctx.provider, governor, proposal_id).await?;
    println!("{state}");
    Ok(())
}

/// Resolve the governor and build the mint proposal described by `args`
fn mint_proposal(args: ProposalArgs, ctx: &ScriptContext) -> Result<(Address, MintProposal), ScriptError> {
    let governor = ctx.contract_address(args.governor_address.as_deref(), GOVERNOR_CONTRACT_NAME)?;
    let token = ctx.contract_address(args.token_address.as_deref(), TOKEN_CONTRACT_NAME)?;
    let recipient = match args.recipient {
        Some(addr) => parse_address(&addr)?,
        None => ctx.deployer,
    };
    let amount = parse_ether(&args.amount)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

    Ok((
        governor,
        MintProposal {
            token,
            recipient,
            amount,
            description: args.description,
        },
    ))
}

/// Parse a decimal proposal ID
fn parse_proposal_id(id: &str) -> Result<U256, ScriptError> {
    U256::from_str(id).map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}
