use std::time::Duration;

use clap::Parser;
use scripts::{
    cli::Cli,
    context::{ContextConfig, ScriptContext},
    errors::ScriptError,
    retry::RetryPolicy,
};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        priv_key,
        rpc_url,
        network,
        etherscan_api_key,
        deployments_path,
        artifacts,
        confirmations,
        max_retries,
        initial_backoff_ms,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    let ctx = ScriptContext::new(ContextConfig {
        priv_key: &priv_key,
        rpc_url: &rpc_url,
        network: &network,
        deployments_path,
        artifacts_path: artifacts,
        etherscan_api_key,
        confirmations,
        retry: RetryPolicy::new(max_retries, Duration::from_millis(initial_backoff_ms)),
    })
    .await?;

    command.run(&ctx).await
}
