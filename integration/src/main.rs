//! Integration tests for the governance and crowdfunding contracts. These
//! assume a local Anvil or Hardhat node is running, and that the contracts
//! have been compiled into a Hardhat artifacts directory.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

mod constants;
mod test_args;
mod test_inventory;
mod tests;
mod util;

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use constants::{DEFAULT_ARTIFACTS_PATH, DEFAULT_PKEY, DEFAULT_RPC_URL};
use eyre::Result;
use test_args::TestArgs;
use test_inventory::IntegrationTest;
use tracing::info;

/// The CLI arguments for the integration tests
#[derive(Debug, Clone, Parser)]
struct CliArgs {
    /// The path to the Hardhat artifacts directory
    #[clap(long, default_value = DEFAULT_ARTIFACTS_PATH)]
    artifacts: PathBuf,
    /// The private key of the deployer
    #[clap(short = 'p', long, env = "PKEY", default_value = DEFAULT_PKEY)]
    pkey: String,
    /// The RPC url to run the tests against
    #[clap(short = 'r', long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    // --- Test Harness Args --- //
    /// Only run tests whose `<module>::<name>` contains this string
    #[arg(short, long)]
    test: Option<String>,
}

// --------------
// | Entrypoint |
// --------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();
    tracing_subscriber::fmt().pretty().init();

    let args = TestArgs::new(&cli)?;
    info!("Running tests against {} as {:#x}", args.rpc_url, args.deployer_addr());
    let tests = inventory::iter::<IntegrationTest>
        .into_iter()
        .filter(|test| match &cli.test {
            Some(filter) => test.full_name().contains(filter.as_str()),
            None => true,
        });

    let mut failures = Vec::new();
    for test in tests {
        let name = test.full_name();
        info!("Running {name}");
        match (test.test_fn)(args.clone()).await {
            Ok(()) => println!("{} {}", "PASS".green().bold(), name),
            Err(e) => {
                println!("{} {}: {}", "FAIL".red().bold(), name, e);
                failures.push(name);
            }
        }
    }

    if !failures.is_empty() {
        eyre::bail!("{} test(s) failed: {}", failures.len(), failures.join(", "));
    }
    println!("{}", "All tests passed".green().bold());
    Ok(())
}
