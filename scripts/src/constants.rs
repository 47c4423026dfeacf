//! Constants used in the deploy and governance scripts

/// The default RPC URL, a locally running Hardhat or Anvil node
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The default network name
pub const DEFAULT_NETWORK: &str = "localhost";

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The default path of the Hardhat artifacts directory
pub const DEFAULT_ARTIFACTS_PATH: &str = "artifacts";

/// The number of confirmations to wait for a contract deployment transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// Gas limit used when deploying the governor, whose creation code exceeds
/// the node's default estimate on some networks
pub const GOVERNOR_GAS_LIMIT: u64 = 30_000_000;

/// How long to wait for a deployment to be mined and confirmed before giving
/// up, in seconds
pub const RECEIPT_TIMEOUT_SECS: u64 = 120;

/// The interval between receipt and block number polls, in milliseconds
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

/// Node error messages meaning a broadcast transaction is already in the pool
pub const ALREADY_KNOWN_ERRORS: &[&str] =
    &["already known", "already imported", "known transaction"];

/// The default number of attempts made for a retried RPC call
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// The default initial backoff between retried RPC calls, in milliseconds
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 250;

/// The upper bound on the backoff between retried RPC calls, in milliseconds
pub const MAX_BACKOFF_MS: u64 = 4_000;

/// Network names treated as local development chains
pub const DEVELOPMENT_NETWORKS: &[&str] = &["hardhat", "localhost", "anvil", "devnet"];

/// Chain IDs treated as local development chains
pub const DEVELOPMENT_CHAIN_IDS: &[u64] = &[31337, 1337];

// ------------------
// | Contract names |
// ------------------

/// The governor contract name
pub const GOVERNOR_CONTRACT_NAME: &str = "MyGovernor";

/// The governance token contract name
pub const TOKEN_CONTRACT_NAME: &str = "Gimnastiky";

/// The crowdfunding contract name
pub const CROWDFUNDING_CONTRACT_NAME: &str = "Crowdfunding";

// ------------------
// | Explorer (API) |
// ------------------

/// The Etherscan v2 multichain API endpoint
pub const ETHERSCAN_API_URL: &str = "https://api.etherscan.io/v2/api";

/// The code format used when submitting sources for verification
pub const STANDARD_JSON_CODE_FORMAT: &str = "solidity-standard-json-input";

/// The number of times to poll the explorer for a verification result
pub const VERIFICATION_STATUS_POLLS: u32 = 10;

/// The delay between verification status polls, in milliseconds
pub const VERIFICATION_POLL_INTERVAL_MS: u64 = 3_000;

/// Timeout for requests made to the explorer API, in seconds
pub const EXPLORER_REQUEST_TIMEOUT_SECS: u64 = 30;

// --------------
// | Governance |
// --------------

/// `castVote` support value for a vote in favour
pub const VOTE_FOR: u8 = 1;

/// The default description of the mint proposal
pub const DEFAULT_PROPOSAL_DESCRIPTION: &str = "Give more voting weight to owner";

/// The default amount of tokens the mint proposal mints, in whole tokens
pub const DEFAULT_PROPOSAL_MINT_AMOUNT: &str = "1000";
