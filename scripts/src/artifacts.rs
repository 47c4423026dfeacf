//! Loading of compiled contracts from a Hardhat artifacts directory

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::primitives::{Address, Bytes};
use serde::Deserialize;

use crate::{errors::ScriptError, types::ContractSpec, verify::VerificationRequest};

/// The directory holding the compiler inputs, skipped when searching for
/// contract artifacts
const BUILD_INFO_DIR: &str = "build-info";
/// The suffix of the debug file written next to each artifact
const DBG_SUFFIX: &str = ".dbg.json";

/// The fields of a Hardhat artifact the scripts use
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HardhatArtifact {
    /// The contract name
    contract_name: String,
    /// The path of the source file the contract is defined in
    source_name: String,
    /// The hex-encoded creation code
    bytecode: String,
}

/// The debug file pointing an artifact at its build info
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    /// The build info path, relative to the debug file
    build_info: String,
}

/// The compiler invocation that produced an artifact
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// The full compiler version, e.g. `0.8.20+commit.a1b79de6`
    pub solc_long_version: String,
    /// The standard JSON input given to the compiler
    pub input: serde_json::Value,
}

/// A compiled contract read from the artifacts directory
#[derive(Clone, Debug)]
pub struct ContractArtifact {
    /// The contract name
    pub contract_name: String,
    /// The source file the contract is defined in, relative to the project
    pub source_name: String,
    /// The creation code
    pub bytecode: Bytes,
    /// Where the artifact was read from
    path: PathBuf,
}

impl ContractArtifact {
    /// Find and load the artifact for `contract_name` under `artifacts_dir`
    pub fn load(artifacts_dir: &Path, contract_name: &str) -> Result<Self, ScriptError> {
        let file_name = format!("{contract_name}.json");
        let path = find_file(artifacts_dir, &file_name)?.ok_or_else(|| {
            ScriptError::ArtifactParsing(format!(
                "no artifact for {} under {}",
                contract_name,
                artifacts_dir.display()
            ))
        })?;

        let artifact: HardhatArtifact = read_json(&path)?;
        let bytecode = Bytes::from_str(&artifact.bytecode).map_err(|e| {
            ScriptError::ArtifactParsing(format!(
                "{contract_name} bytecode is not valid hex (unlinked libraries?): {e}"
            ))
        })?;
        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{contract_name} has no creation code, is it abstract or an interface?"
            )));
        }

        Ok(Self {
            contract_name: artifact.contract_name,
            source_name: artifact.source_name,
            bytecode,
            path,
        })
    }

    /// The `<source>:<contract>` name explorers identify the contract by
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// A deployable spec for the contract
    pub fn spec(&self) -> ContractSpec {
        ContractSpec::new(self.contract_name.clone(), self.bytecode.clone())
    }

    /// Load the build info the artifact was compiled from
    pub fn build_info(&self) -> Result<BuildInfo, ScriptError> {
        let dbg_path = self.path.with_file_name(format!("{}{DBG_SUFFIX}", self.contract_name));
        let dbg: DebugFile = read_json(&dbg_path)?;

        let dir = dbg_path.parent().unwrap_or_else(|| Path::new("."));
        read_json(&dir.join(dbg.build_info))
    }

    /// Everything an explorer needs to verify a deployment of this contract
    pub fn verification_request(
        &self,
        address: Address,
        constructor_args: Bytes,
    ) -> Result<VerificationRequest, ScriptError> {
        let build_info = self.build_info()?;
        let source = serde_json::to_string(&build_info.input)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        Ok(VerificationRequest {
            address,
            contract_name: self.fully_qualified_name(),
            compiler_version: format!("v{}", build_info.solc_long_version),
            source,
            constructor_args,
        })
    }
}

/// Depth-first search for a file named `file_name`, skipping build info
fn find_file(dir: &Path, file_name: &str) -> Result<Option<PathBuf>, ScriptError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        ScriptError::ArtifactParsing(format!("cannot read {}: {}", dir.display(), e))
    })?;

    let mut subdirs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?
            .path();
        if path.is_dir() {
            if !path.ends_with(BUILD_INFO_DIR) {
                subdirs.push(path);
            }
        } else if path.file_name().is_some_and(|name| name == file_name) {
            return Ok(Some(path));
        }
    }

    subdirs.sort();
    for subdir in subdirs {
        if let Some(found) = find_file(&subdir, file_name)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Read and deserialize a JSON file
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ScriptError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    /// Lay out a Hardhat artifacts tree holding a single contract
    fn write_artifacts(bytecode: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let contract_dir = dir.path().join("contracts").join("Gimnastiky.sol");
        let build_info_dir = dir.path().join(BUILD_INFO_DIR);
        fs::create_dir_all(&contract_dir).unwrap();
        fs::create_dir_all(&build_info_dir).unwrap();

        let artifact = json!({
            "_format": "hh-sol-artifact-1",
            "contractName": "Gimnastiky",
            "sourceName": "contracts/Gimnastiky.sol",
            "abi": [],
            "bytecode": bytecode,
            "deployedBytecode": "0x",
        });
        let dbg = json!({
            "_format": "hh-sol-dbg-1",
            "buildInfo": "../../build-info/4f1c.json",
        });
        let build_info = json!({
            "id": "4f1c",
            "solcVersion": "0.8.20",
            "solcLongVersion": "0.8.20+commit.a1b79de6",
            "input": { "language": "Solidity", "sources": {} },
        });

        fs::write(contract_dir.join("Gimnastiky.json"), artifact.to_string()).unwrap();
        fs::write(contract_dir.join("Gimnastiky.dbg.json"), dbg.to_string()).unwrap();
        fs::write(build_info_dir.join("4f1c.json"), build_info.to_string()).unwrap();
        dir
    }

    #[test]
    fn test_load_artifact() {
        let dir = write_artifacts("0x6080604052");
        let artifact = ContractArtifact::load(dir.path(), "Gimnastiky").unwrap();

        assert_eq!(artifact.bytecode.to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(artifact.fully_qualified_name(), "contracts/Gimnastiky.sol:Gimnastiky");
        assert_eq!(artifact.spec().name, "Gimnastiky");
    }

    #[test]
    fn test_missing_artifact() {
        let dir = write_artifacts("0x6080604052");
        let res = ContractArtifact::load(dir.path(), "Crowfunding");
        assert!(matches!(res, Err(ScriptError::ArtifactParsing(_))));
    }

    #[test]
    fn test_empty_bytecode_is_rejected() {
        let dir = write_artifacts("0x");
        let res = ContractArtifact::load(dir.path(), "Gimnastiky");
        assert!(matches!(res, Err(ScriptError::ArtifactParsing(_))));
    }

    #[test]
    fn test_unlinked_bytecode_is_rejected() {
        let dir = write_artifacts("0x6080__$ab12cd$__6040");
        let res = ContractArtifact::load(dir.path(), "Gimnastiky");
        assert!(matches!(res, Err(ScriptError::ArtifactParsing(_))));
    }

    #[test]
    fn test_verification_request_from_build_info() {
        let dir = write_artifacts("0x6080604052");
        let artifact = ContractArtifact::load(dir.path(), "Gimnastiky").unwrap();
        let address = Address::repeat_byte(0x11);
        let args = Bytes::from_static(&[0xab]);

        let request = artifact.verification_request(address, args.clone()).unwrap();
        assert_eq!(request.address, address);
        assert_eq!(request.compiler_version, "v0.8.20+commit.a1b79de6");
        assert_eq!(request.contract_name, "contracts/Gimnastiky.sol:Gimnastiky");
        assert_eq!(request.constructor_args, args);

        let source: serde_json::Value = serde_json::from_str(&request.source).unwrap();
        assert_eq!(source["language"], "Solidity");
    }
}
