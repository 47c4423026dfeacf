//! Constants used in the integration tests

/// The default private key for the tests, the first default account in an Anvil or Hardhat node
pub(crate) const DEFAULT_PKEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// The default RPC url of a local Anvil or Hardhat node
pub(crate) const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The default path of the Hardhat artifacts directory
pub(crate) const DEFAULT_ARTIFACTS_PATH: &str = "../artifacts";

/// Private keys of the next three default node accounts, used as backers,
/// campaign owners and other non-admin callers
pub(crate) const ACCOUNT_PKEYS: [&str; 3] = [
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "0x7c852118294e51e464e5aa5b6b28d5f1d45d96d7ecd5a68b6a8ddd11e4f6bd2a",
];

/// The number of tokens the governance token mints to its deployer
pub(crate) const INITIAL_TOKEN_SUPPLY: &str = "1000";

/// The revert reason of a zero-value contribution
pub(crate) const ZERO_CONTRIBUTION_REASON: &str = "Cannot contribute 0 Eth";
