//! Ordered deployment of contracts, including pairs of contracts whose
//! constructors reference each other

use alloy::{primitives::Address, primitives::Bytes, sol_types::SolValue};
use tracing::info;

use crate::{
    address::{fetch_and_predict, predict_contract_address},
    chain::{DeployChain, DeploymentTx},
    errors::ScriptError,
    types::{ContractSpec, DeployedContract, LinkDirection, LinkedDeployment},
};

/// ABI-encode an address as the sole constructor argument of a linked
/// contract
pub fn encode_link_arg(address: Address) -> Bytes {
    address.abi_encode().into()
}

/// Deploy a single contract with the given encoded constructor arguments,
/// at the deployer's current nonce
pub async fn deploy_contract(
    chain: &impl DeployChain,
    spec: &ContractSpec,
    constructor_args: Bytes,
) -> Result<DeployedContract, ScriptError> {
    let (nonce, predicted) = fetch_and_predict(chain, 0).await?;
    deploy_at(chain, spec, constructor_args, nonce, predicted).await
}

/// Deploy two contracts whose constructors each take the other's address.
///
/// The first contract (per `direction`) is constructed with the predicted
/// address of the second, computed from the deployer's nonce before either
/// deployment. The second is constructed with the first's real address, and
/// its real address is checked against the prediction.
///
/// `on_deployed` is called with each contract as soon as it is confirmed, so
/// a caller can record the first contract before the second is sent and
/// resume with [`deploy_linked_second`] if the second fails.
///
/// Nothing else may send transactions from the deployer while this runs;
/// any drift in the nonce is reported as [`ScriptError::NonceDrift`] rather
/// than producing a mislinked pair.
pub async fn deploy_linked_pair(
    chain: &impl DeployChain,
    contract_a: &ContractSpec,
    contract_b: &ContractSpec,
    direction: LinkDirection,
    mut on_deployed: impl FnMut(&DeployedContract) -> Result<(), ScriptError>,
) -> Result<LinkedDeployment, ScriptError> {
    let (first, second) = match direction {
        LinkDirection::AThenB => (contract_a, contract_b),
        LinkDirection::BThenA => (contract_b, contract_a),
    };

    let (nonce, first_predicted) = fetch_and_predict(chain, 0).await?;
    let second_predicted = predict_contract_address(chain.deployer(), nonce, 1)?;
    info!(
        "Linking {} -> {:#x} (predicted), deploying {} first",
        first.name, second_predicted, first.name
    );

    let first_deployed = deploy_at(
        chain,
        first,
        encode_link_arg(second_predicted),
        nonce,
        first_predicted,
    )
    .await?;
    on_deployed(&first_deployed)?;

    let second_deployed = deploy_linked_second(chain, &first_deployed, second).await?;
    if second_deployed.address != second_predicted {
        return Err(ScriptError::PredictionMismatch {
            predicted: second_predicted,
            actual: second_deployed.address,
        });
    }
    on_deployed(&second_deployed)?;

    let (contract_a, contract_b) = match direction {
        LinkDirection::AThenB => (first_deployed, second_deployed),
        LinkDirection::BThenA => (second_deployed, first_deployed),
    };
    Ok(LinkedDeployment {
        contract_a,
        contract_b,
    })
}

/// Deploy the second contract of a linked pair, constructed with the real
/// address of the already deployed first contract.
///
/// Fails if any deployer transaction landed after the first deployment,
/// since the first contract's reference to this one would then be wrong.
pub async fn deploy_linked_second(
    chain: &impl DeployChain,
    first: &DeployedContract,
    second: &ContractSpec,
) -> Result<DeployedContract, ScriptError> {
    let expected = first.nonce.checked_add(1).ok_or(ScriptError::NonceOverflow)?;
    let (nonce, predicted) = fetch_and_predict(chain, 0).await?;
    if nonce != expected {
        return Err(ScriptError::NonceDrift {
            expected,
            actual: nonce,
        });
    }

    deploy_at(chain, second, encode_link_arg(first.address), nonce, predicted).await
}

/// Deploy `spec` at a pinned nonce, checking the chain placed it where the
/// nonce says it should be
async fn deploy_at(
    chain: &impl DeployChain,
    spec: &ContractSpec,
    constructor_args: Bytes,
    nonce: u64,
    predicted: Address,
) -> Result<DeployedContract, ScriptError> {
    info!("Deploying {} at nonce {}", spec.name, nonce);
    let tx = DeploymentTx {
        name: spec.name.clone(),
        init_code: spec.init_code(&constructor_args),
        nonce,
        gas_limit: spec.gas_limit,
    };

    let receipt = chain.send_deployment(&tx).await.map_err(|e| match e {
        e @ (ScriptError::NonceDrift { .. } | ScriptError::PredictionMismatch { .. }) => e,
        e => ScriptError::DeploymentFailed {
            step: spec.name.clone(),
            cause: e.to_string(),
        },
    })?;

    if receipt.address != predicted {
        return Err(ScriptError::PredictionMismatch {
            predicted,
            actual: receipt.address,
        });
    }

    info!("{} deployed at {:#x}", spec.name, receipt.address);
    Ok(DeployedContract {
        name: spec.name.clone(),
        address: receipt.address,
        nonce,
        constructor_args,
    })
}
