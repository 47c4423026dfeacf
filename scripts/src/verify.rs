//! Source verification on an Etherscan-compatible block explorer

use std::time::Duration;

use alloy::primitives::{hex, Address, Bytes};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    constants::{
        ETHERSCAN_API_URL, EXPLORER_REQUEST_TIMEOUT_SECS, STANDARD_JSON_CODE_FORMAT,
        VERIFICATION_POLL_INTERVAL_MS, VERIFICATION_STATUS_POLLS,
    },
    errors::ScriptError,
    types::Network,
};

/// A deployed contract, with the source metadata an explorer needs to
/// verify it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationRequest {
    /// The deployed address
    pub address: Address,
    /// The fully qualified contract name, `<source>:<contract>`
    pub contract_name: String,
    /// The compiler version, e.g. `v0.8.20+commit.a1b79de6`
    pub compiler_version: String,
    /// The standard JSON compiler input
    pub source: String,
    /// The ABI-encoded constructor arguments
    pub constructor_args: Bytes,
}

/// The outcome of a verification attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationResult {
    /// Verification does not apply to the network, or no API key is set
    Skipped,
    /// The explorer accepted the source
    Verified,
    /// The explorer already had the source
    AlreadyVerified,
    /// The explorer rejected the source, or could not be reached
    Failed(String),
}

impl VerificationResult {
    /// Whether the contract's source is verified on the explorer
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationResult::Verified | VerificationResult::AlreadyVerified)
    }
}

/// A service that verifies contract sources
#[allow(async_fn_in_trait)]
pub trait SourceVerifier {
    /// Submit the request and wait for the explorer's verdict
    async fn verify(
        &self,
        chain_id: u64,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, ScriptError>;
}

/// Verify a deployment if the network is public and a verifier is
/// configured.
///
/// Never fails: a verification problem is logged and reported as
/// [`VerificationResult::Failed`], leaving the deployment itself intact.
pub async fn verify_if_public<V: SourceVerifier>(
    verifier: Option<&V>,
    network: &Network,
    request: &VerificationRequest,
) -> VerificationResult {
    if network.is_development() {
        info!("Skipping verification of {} on {}", request.contract_name, network);
        return VerificationResult::Skipped;
    }
    let Some(verifier) = verifier else {
        info!(
            "No explorer API key configured, skipping verification of {}",
            request.contract_name
        );
        return VerificationResult::Skipped;
    };

    info!("Verifying {} at {:#x}", request.contract_name, request.address);
    match verifier.verify(network.chain_id, request).await {
        Ok(VerificationResult::Failed(reason)) => {
            warn!("Verification of {} failed: {}", request.contract_name, reason);
            VerificationResult::Failed(reason)
        }
        Ok(result) => {
            info!("{} verification: {:?}", request.contract_name, result);
            result
        }
        Err(e) => {
            error!("Error verifying {}: {}", request.contract_name, e);
            VerificationResult::Failed(e.to_string())
        }
    }
}

// ---------------------
// | Etherscan backend |
// ---------------------

/// The envelope of every Etherscan API response
#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    /// `1` on success, `0` otherwise
    status: String,
    /// A short status message
    #[serde(default)]
    message: String,
    /// The GUID of a queued submission, or a description of the outcome
    #[serde(default)]
    result: String,
}

/// What the explorer made of a source submission
#[derive(Debug, PartialEq, Eq)]
enum Submission {
    /// Queued under the given GUID
    Queued(String),
    /// Nothing to do
    AlreadyVerified,
    /// Rejected outright
    Rejected(String),
}

/// The state of a queued verification
#[derive(Debug, PartialEq, Eq)]
enum CheckStatus {
    /// Still in the explorer's queue
    Pending,
    /// Finished with the given result
    Done(VerificationResult),
}

/// Whether an explorer message says the source is already verified
fn is_already_verified(message: &str) -> bool {
    message.to_lowercase().contains("already verified")
}

/// Interpret the response to `verifysourcecode`
fn classify_submission(resp: &EtherscanResponse) -> Submission {
    if resp.status == "1" {
        return Submission::Queued(resp.result.clone());
    }
    if is_already_verified(&resp.result) || is_already_verified(&resp.message) {
        return Submission::AlreadyVerified;
    }
    Submission::Rejected(format!("{}: {}", resp.message, resp.result))
}

/// Interpret the response to `checkverifystatus`
fn classify_status(resp: &EtherscanResponse) -> CheckStatus {
    let result = resp.result.to_lowercase();
    if result.contains("pending") {
        CheckStatus::Pending
    } else if is_already_verified(&result) {
        CheckStatus::Done(VerificationResult::AlreadyVerified)
    } else if resp.status == "1" || result.contains("pass") {
        CheckStatus::Done(VerificationResult::Verified)
    } else {
        CheckStatus::Done(VerificationResult::Failed(resp.result.clone()))
    }
}

/// A verifier backed by the Etherscan v2 multichain API
#[derive(Clone, Debug)]
pub struct EtherscanVerifier {
    /// The explorer API key
    api_key: String,
    /// The API endpoint
    api_url: String,
    /// The HTTP client, with the request timeout applied
    client: Client,
}

impl EtherscanVerifier {
    /// Create a verifier using the given API key
    pub fn new(api_key: String) -> Result<Self, ScriptError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(EXPLORER_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScriptError::Verification(e.to_string()))?;

        Ok(Self {
            api_key,
            api_url: ETHERSCAN_API_URL.to_string(),
            client,
        })
    }

    /// Point the verifier at a different Etherscan-compatible API
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn submit(
        &self,
        chain_id: u64,
        request: &VerificationRequest,
    ) -> Result<Submission, ScriptError> {
        let address = format!("{:#x}", request.address);
        let constructor_args = hex::encode(&request.constructor_args);
        let form = [
            ("apikey", self.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("codeformat", STANDARD_JSON_CODE_FORMAT),
            ("sourceCode", request.source.as_str()),
            ("contractaddress", address.as_str()),
            ("contractname", request.contract_name.as_str()),
            ("compilerversion", request.compiler_version.as_str()),
            // Misspelling is part of the API
            ("constructorArguements", constructor_args.as_str()),
        ];

        let resp: EtherscanResponse = self
            .client
            .post(&self.api_url)
            .query(&[("chainid", chain_id)])
            .form(&form)
            .send()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?
            .json()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?;

        Ok(classify_submission(&resp))
    }

    async fn check_status(&self, chain_id: u64, guid: &str) -> Result<CheckStatus, ScriptError> {
        let chain_id = chain_id.to_string();
        let resp: EtherscanResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("chainid", chain_id.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?
            .json()
            .await
            .map_err(|e| ScriptError::Verification(e.to_string()))?;

        Ok(classify_status(&resp))
    }
}

impl SourceVerifier for EtherscanVerifier {
    async fn verify(
        &self,
        chain_id: u64,
        request: &VerificationRequest,
    ) -> Result<VerificationResult, ScriptError> {
        let guid = match self.submit(chain_id, request).await? {
            Submission::Queued(guid) => guid,
            Submission::AlreadyVerified => return Ok(VerificationResult::AlreadyVerified),
            Submission::Rejected(reason) => return Ok(VerificationResult::Failed(reason)),
        };

        for _ in 0..VERIFICATION_STATUS_POLLS {
            tokio::time::sleep(Duration::from_millis(VERIFICATION_POLL_INTERVAL_MS)).await;
            if let CheckStatus::Done(result) = self.check_status(chain_id, &guid).await? {
                return Ok(result);
            }
        }

        Err(ScriptError::Verification(format!(
            "verification {guid} still pending after {VERIFICATION_STATUS_POLLS} polls"
        )))
    }
}
