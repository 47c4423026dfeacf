//! Definitions of errors that can occur during the execution of the deploy and governance scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use alloy::primitives::Address;

/// Errors that can occur during the execution of the deploy and governance scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error reading the deployments file
    ReadDeployments(String),
    /// Error writing the deployments file
    WriteDeployments(String),
    /// Error reading or parsing a compilation artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error reading chain state (nonce, receipt, code, balance)
    ChainQuery(String),
    /// A contract call was rejected by the contract logic
    TransactionReverted {
        /// The decoded revert reason, if one was returned
        reason: String,
    },
    /// A contract creation transaction failed or never confirmed
    DeploymentFailed {
        /// The deployment step that failed
        step: String,
        /// The underlying failure
        cause: String,
    },
    /// A precomputed contract address did not match the realised one
    PredictionMismatch {
        /// The address predicted before deployment
        predicted: Address,
        /// The address the chain actually assigned
        actual: Address,
    },
    /// The deployer's nonce moved underneath a linked deployment
    NonceDrift {
        /// The nonce the orchestrator expected to submit at
        expected: u64,
        /// The nonce reported by the chain
        actual: u64,
    },
    /// `nonce + offset` does not fit in a `u64`
    NonceOverflow,
    /// A transaction was not mined, or not confirmed deeply enough, in time
    ConfirmationTimeout(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// An expected event was missing from a transaction receipt
    EventNotFound(String),
    /// Error submitting or checking a source verification
    Verification(String),
}

impl ScriptError {
    /// Whether the error is a transient RPC failure that is safe to retry
    pub fn is_transient(&self) -> bool {
        matches!(self, ScriptError::ChainQuery(_))
    }
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ChainQuery(s) => write!(f, "error querying chain: {}", s),
            ScriptError::TransactionReverted { reason } => {
                write!(f, "transaction reverted: {}", reason)
            }
            ScriptError::DeploymentFailed { step, cause } => {
                write!(f, "deployment failed at {}: {}", step, cause)
            }
            ScriptError::PredictionMismatch { predicted, actual } => write!(
                f,
                "predicted address {:#x} does not match deployed address {:#x}",
                predicted, actual
            ),
            ScriptError::NonceDrift { expected, actual } => write!(
                f,
                "deployer nonce drifted: expected {}, chain reports {}",
                expected, actual
            ),
            ScriptError::NonceOverflow => write!(f, "nonce offset overflows u64"),
            ScriptError::ConfirmationTimeout(s) => write!(f, "timed out waiting for confirmation: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::EventNotFound(s) => write!(f, "event not found in receipt: {}", s),
            ScriptError::Verification(s) => write!(f, "error verifying contract: {}", s),
        }
    }
}

impl Error for ScriptError {}
