//! Reading and writing the deployments file
//!
//! The file maps a network name to the contracts deployed on it:
//!
//! ```json
//! {
//!   "sepolia": {
//!     "MyGovernor": { "address": "0x..", "constructorArgs": "0x..", "nonce": 4 }
//!   }
//! }
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{errors::ScriptError, types::DeployedContract};

/// The deployments recorded on each network, keyed by network then contract
pub type Deployments = BTreeMap<String, BTreeMap<String, DeploymentRecord>>;

/// A deployed contract, as recorded in the deployments file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    /// The contract address
    pub address: Address,
    /// The ABI-encoded constructor arguments
    #[serde(default)]
    pub constructor_args: Bytes,
    /// The deployer nonce of the creation transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
}

impl From<&DeployedContract> for DeploymentRecord {
    fn from(deployed: &DeployedContract) -> Self {
        Self {
            address: deployed.address,
            constructor_args: deployed.constructor_args.clone(),
            nonce: Some(deployed.nonce),
        }
    }
}

/// Read every deployment in the file. A missing file holds no deployments.
pub fn read_deployments(deployments_path: &Path) -> Result<Deployments, ScriptError> {
    if !deployments_path.exists() {
        return Ok(Deployments::new());
    }

    let content = fs::read_to_string(deployments_path).map_err(|e| {
        ScriptError::ReadDeployments(format!("{}: {}", deployments_path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        ScriptError::ReadDeployments(format!("{}: {}", deployments_path.display(), e))
    })
}

/// Read the record of `contract` on `network`
pub fn read_deployment(
    network: &str,
    contract: &str,
    deployments_path: &Path,
) -> Result<DeploymentRecord, ScriptError> {
    read_deployments(deployments_path)?
        .get(network)
        .and_then(|contracts| contracts.get(contract))
        .cloned()
        .ok_or_else(|| {
            ScriptError::ReadDeployments(format!(
                "no {} deployment recorded for network {}",
                contract, network
            ))
        })
}

/// Rebuild a deployed contract from its record, for resuming a linked pair.
/// The record must carry the creation nonce.
pub fn read_deployed_contract(
    network: &str,
    contract: &str,
    deployments_path: &Path,
) -> Result<DeployedContract, ScriptError> {
    let record = read_deployment(network, contract, deployments_path)?;
    let nonce = record.nonce.ok_or_else(|| {
        ScriptError::ReadDeployments(format!("no nonce recorded for {contract} on {network}"))
    })?;

    Ok(DeployedContract {
        name: contract.to_string(),
        address: record.address,
        nonce,
        constructor_args: record.constructor_args,
    })
}

/// Read the address of `contract` on `network`
pub fn read_deployment_address(
    network: &str,
    contract: &str,
    deployments_path: &Path,
) -> Result<Address, ScriptError> {
    read_deployment(network, contract, deployments_path).map(|record| record.address)
}

/// Record a deployment, keeping every other entry in the file
pub fn write_deployment(
    network: &str,
    deployed: &DeployedContract,
    deployments_path: &Path,
) -> Result<(), ScriptError> {
    let mut deployments = read_deployments(deployments_path)?;
    deployments
        .entry(network.to_string())
        .or_default()
        .insert(deployed.name.clone(), DeploymentRecord::from(deployed));

    let content = serde_json::to_string_pretty(&deployments)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(deployments_path, content).map_err(|e| {
        ScriptError::WriteDeployments(format!("{}: {}", deployments_path.display(), e))
    })?;

    info!(
        "Recorded {} at {:#x} on {} in {}",
        deployed.name,
        deployed.address,
        network,
        deployments_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A deployment whose address and arguments are filled with `byte`
    fn deployed(name: &str, byte: u8, nonce: u64) -> DeployedContract {
        DeployedContract {
            name: name.to_string(),
            address: Address::repeat_byte(byte),
            nonce,
            constructor_args: Bytes::from(vec![byte; 32]),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");

        assert!(read_deployments(&path).unwrap().is_empty());
        assert!(matches!(
            read_deployment_address("localhost", "MyGovernor", &path),
            Err(ScriptError::ReadDeployments(_))
        ));
    }

    #[test]
    fn test_write_merges_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");

        write_deployment("localhost", &deployed("MyGovernor", 0x01, 0), &path).unwrap();
        write_deployment("localhost", &deployed("Gimnastiky", 0x02, 1), &path).unwrap();
        write_deployment("sepolia", &deployed("MyGovernor", 0x03, 7), &path).unwrap();

        assert_eq!(
            read_deployment_address("localhost", "MyGovernor", &path).unwrap(),
            Address::repeat_byte(0x01)
        );
        assert_eq!(
            read_deployment_address("localhost", "Gimnastiky", &path).unwrap(),
            Address::repeat_byte(0x02)
        );

        let record = read_deployment("sepolia", "MyGovernor", &path).unwrap();
        assert_eq!(record.address, Address::repeat_byte(0x03));
        assert_eq!(record.nonce, Some(7));
        assert_eq!(record.constructor_args, Bytes::from(vec![0x03; 32]));
    }

    #[test]
    fn test_deployed_contract_round_trips_through_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");

        let governor = deployed("MyGovernor", 0x04, 12);
        write_deployment("localhost", &governor, &path).unwrap();
        assert_eq!(read_deployed_contract("localhost", "MyGovernor", &path).unwrap(), governor);

        // Records written by hand may lack the nonce needed to resume
        fs::write(&path, r#"{"localhost":{"Gimnastiky":{"address":"0x0202020202020202020202020202020202020202"}}}"#)
            .unwrap();
        assert!(matches!(
            read_deployed_contract("localhost", "Gimnastiky", &path),
            Err(ScriptError::ReadDeployments(_))
        ));
    }

    #[test]
    fn test_redeploy_overwrites_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");

        write_deployment("localhost", &deployed("Crowdfunding", 0x01, 0), &path).unwrap();
        write_deployment("localhost", &deployed("Crowdfunding", 0x09, 1), &path).unwrap();

        let deployments = read_deployments(&path).unwrap();
        assert_eq!(deployments["localhost"].len(), 1);
        assert_eq!(deployments["localhost"]["Crowdfunding"].address, Address::repeat_byte(0x09));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(read_deployments(&path), Err(ScriptError::ReadDeployments(_))));
        assert!(matches!(
            write_deployment("localhost", &deployed("MyGovernor", 0x01, 0), &path),
            Err(ScriptError::ReadDeployments(_))
        ));
    }
}
