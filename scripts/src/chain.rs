//! The chain interface used by the deployment orchestrator, and its RPC
//! implementation

use std::{cell::Cell, time::Duration};

use alloy::{
    eips::Encodable2718,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, TxHash},
    providers::{DynProvider, Provider},
    rpc::types::TransactionRequest,
    transports::{RpcError, TransportError},
};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::{
    constants::{
        ALREADY_KNOWN_ERRORS, NUM_DEPLOY_CONFIRMATIONS, RECEIPT_POLL_INTERVAL_MS,
        RECEIPT_TIMEOUT_SECS,
    },
    errors::ScriptError,
    retry::RetryPolicy,
    utils::{payload_revert_reason, wallet_address},
};

/// A contract creation transaction pinned to a specific deployer nonce
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentTx {
    /// The name of the contract being created
    pub name: String,
    /// Creation code followed by the encoded constructor arguments
    pub init_code: Bytes,
    /// The deployer nonce the transaction must be sent at
    pub nonce: u64,
    /// An explicit gas limit, if any
    pub gas_limit: Option<u64>,
}

/// The confirmed result of a contract creation transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentReceipt {
    /// The address the chain assigned to the new contract
    pub address: Address,
    /// The creation transaction hash
    pub tx_hash: TxHash,
    /// Gas used by the creation transaction
    pub gas_used: u64,
}

/// The operations the deployment orchestrator needs from a chain.
///
/// All transactions go through the single deployer account returned by
/// [`DeployChain::deployer`].
#[allow(async_fn_in_trait)]
pub trait DeployChain {
    /// The account that signs and sends the creation transactions
    fn deployer(&self) -> Address;

    /// The deployer's current transaction count
    async fn transaction_count(&self) -> Result<u64, ScriptError>;

    /// Send a creation transaction and wait for it to be confirmed
    async fn send_deployment(&self, tx: &DeploymentTx) -> Result<DeploymentReceipt, ScriptError>;
}

// ---------------
// | Node access |
// ---------------

/// A creation transaction signed locally, so its hash is known before it is
/// broadcast
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedCreation {
    /// The transaction hash
    pub hash: TxHash,
    /// The EIP-2718 encoded transaction
    pub raw: Bytes,
}

/// The parts of a mined creation transaction's receipt a deployment checks
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreationReceipt {
    /// Whether the transaction succeeded
    pub status: bool,
    /// The address of the created contract
    pub contract_address: Option<Address>,
    /// The block the transaction was mined in
    pub block_number: Option<u64>,
    /// Gas used by the transaction
    pub gas_used: u64,
}

/// The single-request node operations an [`RpcChain`] is built from.
///
/// Implementations make one request per call; retries, receipt polling and
/// confirmation counting are layered on top by [`RpcChain`].
#[allow(async_fn_in_trait)]
pub trait NodeClient {
    /// The account creation transactions are signed by
    fn signer(&self) -> Address;

    /// The signer's transaction count
    async fn transaction_count(&self) -> Result<u64, ScriptError>;

    /// The latest block number
    async fn block_number(&self) -> Result<u64, ScriptError>;

    /// Fill in and sign a creation transaction
    async fn sign_creation(&self, tx: &DeploymentTx) -> Result<SignedCreation, ScriptError>;

    /// Broadcast a signed transaction
    async fn broadcast(&self, raw: &Bytes) -> Result<(), ScriptError>;

    /// The receipt of a transaction, `None` while it is not mined
    async fn creation_receipt(&self, hash: TxHash) -> Result<Option<CreationReceipt>, ScriptError>;
}

/// A [`NodeClient`] backed by a JSON-RPC provider and a local wallet
#[derive(Clone)]
pub struct ProviderNode {
    /// The provider
    provider: DynProvider,
    /// The wallet creation transactions are signed with
    wallet: EthereumWallet,
}

impl ProviderNode {
    /// Create a node client signing with the wallet's default signer
    pub fn new(provider: DynProvider, wallet: EthereumWallet) -> Self {
        Self { provider, wallet }
    }
}

/// Map a failed read to a retryable query error
fn query_error(e: impl ToString) -> ScriptError {
    ScriptError::ChainQuery(e.to_string())
}

/// Map a failed write, surfacing node rejections as reverts
fn rejection_error(e: TransportError) -> ScriptError {
    match e {
        RpcError::ErrorResp(payload) => ScriptError::TransactionReverted {
            reason: payload_revert_reason(&payload),
        },
        e => query_error(e),
    }
}

impl NodeClient for ProviderNode {
    fn signer(&self) -> Address {
        wallet_address(&self.wallet)
    }

    async fn transaction_count(&self) -> Result<u64, ScriptError> {
        self.provider
            .get_transaction_count(self.signer())
            .await
            .map_err(query_error)
    }

    async fn block_number(&self) -> Result<u64, ScriptError> {
        self.provider.get_block_number().await.map_err(query_error)
    }

    async fn sign_creation(&self, tx: &DeploymentTx) -> Result<SignedCreation, ScriptError> {
        let request = TransactionRequest::default()
            .with_from(self.signer())
            .with_deploy_code(tx.init_code.clone())
            .with_nonce(tx.nonce);

        let gas_limit = match tx.gas_limit {
            Some(gas_limit) => gas_limit,
            None => self
                .provider
                .estimate_gas(request.clone())
                .await
                .map_err(rejection_error)?,
        };
        let chain_id = self.provider.get_chain_id().await.map_err(query_error)?;
        let fees = self
            .provider
            .estimate_eip1559_fees()
            .await
            .map_err(query_error)?;

        let envelope = request
            .with_gas_limit(gas_limit)
            .with_chain_id(chain_id)
            .with_max_fee_per_gas(fees.max_fee_per_gas)
            .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas)
            .build(&self.wallet)
            .await
            .map_err(|e| {
                ScriptError::ClientInitialization(format!("cannot sign {} creation: {e}", tx.name))
            })?;

        Ok(SignedCreation {
            hash: *envelope.tx_hash(),
            raw: envelope.encoded_2718().into(),
        })
    }

    async fn broadcast(&self, raw: &Bytes) -> Result<(), ScriptError> {
        self.provider
            .send_raw_transaction(raw.as_ref())
            .await
            .map(|_| ())
            .map_err(rejection_error)
    }

    async fn creation_receipt(&self, hash: TxHash) -> Result<Option<CreationReceipt>, ScriptError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(query_error)?;

        Ok(receipt.map(|receipt| CreationReceipt {
            status: receipt.status(),
            contract_address: receipt.contract_address,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        }))
    }
}

// -------------
// | RPC chain |
// -------------

/// A [`DeployChain`] that signs creation transactions locally, resubmits
/// them only while their nonce is unspent, and waits for a number of
/// confirmations
#[derive(Clone)]
pub struct RpcChain<C = ProviderNode> {
    /// The node the chain talks to
    node: C,
    /// The number of confirmations to wait for on each deployment
    confirmations: u64,
    /// The retry policy applied to each node request
    retry: RetryPolicy,
    /// How long a deployment may take to be mined and confirmed
    timeout: Duration,
    /// The interval between receipt and block number polls
    poll_interval: Duration,
}

impl RpcChain {
    /// Create a chain client for the given provider, deploying from the
    /// wallet's default signer
    pub fn new(provider: DynProvider, wallet: EthereumWallet) -> Self {
        Self::with_node(ProviderNode::new(provider, wallet))
    }
}

impl<C: NodeClient> RpcChain<C> {
    /// Create a chain client over the given node
    pub fn with_node(node: C) -> Self {
        Self {
            node,
            confirmations: NUM_DEPLOY_CONFIRMATIONS,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(RECEIPT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(RECEIPT_POLL_INTERVAL_MS),
        }
    }

    /// Set the number of confirmations to wait for on each deployment
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Set the retry policy applied to each node request
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set how long a deployment may take to be mined and confirmed, and how
    /// often it is polled meanwhile
    pub fn with_timeouts(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    /// The underlying node
    pub fn node(&self) -> &C {
        &self.node
    }

    /// Broadcast the signed creation transaction.
    ///
    /// Every attempt first checks the pinned nonce. Once it is spent, the
    /// deployment only counts as sent if this exact transaction was
    /// broadcast before and has a receipt; otherwise another transaction
    /// took the nonce.
    async fn submit(&self, tx: &DeploymentTx, signed: &SignedCreation) -> Result<(), ScriptError> {
        let node = &self.node;
        let broadcast = &Cell::new(false);

        self.retry
            .run(&format!("{} deployment", tx.name), move |_| async move {
                let current = node.transaction_count().await?;
                if current > tx.nonce {
                    if broadcast.get() && node.creation_receipt(signed.hash).await?.is_some() {
                        warn!(
                            "An earlier broadcast of {} tx {} was mined",
                            tx.name, signed.hash
                        );
                        return Ok(());
                    }
                    return Err(ScriptError::NonceDrift {
                        expected: tx.nonce,
                        actual: current,
                    });
                }

                let resend = broadcast.replace(true);
                match node.broadcast(&signed.raw).await {
                    Err(ScriptError::TransactionReverted { reason })
                        if resend && is_already_known(&reason) =>
                    {
                        Ok(())
                    }
                    res => res,
                }
            })
            .await
    }

    /// Poll for the transaction's receipt until the deadline
    async fn await_receipt(
        &self,
        hash: TxHash,
        deadline: Instant,
    ) -> Result<CreationReceipt, ScriptError> {
        let node = &self.node;
        loop {
            let receipt = self
                .retry
                .run("receipt lookup", move |_| node.creation_receipt(hash))
                .await?;
            if let Some(receipt) = receipt {
                return Ok(receipt);
            }

            if Instant::now() >= deadline {
                return Err(ScriptError::ConfirmationTimeout(format!(
                    "tx {hash} not mined within {:?}",
                    self.timeout
                )));
            }
            sleep(self.poll_interval).await;
        }
    }

    /// Poll the chain head until the transaction mined in `mined_in` has the
    /// configured number of confirmations, or the deadline passes
    async fn await_confirmations(
        &self,
        hash: TxHash,
        mined_in: u64,
        deadline: Instant,
    ) -> Result<(), ScriptError> {
        let node = &self.node;
        loop {
            let head = self
                .retry
                .run("block number query", move |_| node.block_number())
                .await?;
            let confirmations = confirmation_depth(mined_in, head);
            if confirmations >= self.confirmations {
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(ScriptError::ConfirmationTimeout(format!(
                    "tx {hash} has {confirmations} of {} confirmations after {:?}",
                    self.confirmations, self.timeout
                )));
            }
            sleep(self.poll_interval).await;
        }
    }
}

impl<C: NodeClient> DeployChain for RpcChain<C> {
    fn deployer(&self) -> Address {
        self.node.signer()
    }

    async fn transaction_count(&self) -> Result<u64, ScriptError> {
        let node = &self.node;
        self.retry
            .run("nonce query", move |_| node.transaction_count())
            .await
    }

    async fn send_deployment(&self, tx: &DeploymentTx) -> Result<DeploymentReceipt, ScriptError> {
        let node = &self.node;
        let signed = self
            .retry
            .run(&format!("{} signing", tx.name), move |_| node.sign_creation(tx))
            .await?;

        let deadline = Instant::now() + self.timeout;
        self.submit(tx, &signed).await?;
        info!(
            "Sent {} creation tx {} at nonce {}, waiting for {} confirmation(s)",
            tx.name, signed.hash, tx.nonce, self.confirmations
        );

        let receipt = self.await_receipt(signed.hash, deadline).await?;
        if !receipt.status {
            return Err(ScriptError::TransactionReverted {
                reason: format!("creation tx {} reverted", signed.hash),
            });
        }

        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::ContractInteraction(format!(
                "receipt for {} has no contract address",
                signed.hash
            ))
        })?;
        let mined_in = receipt.block_number.ok_or_else(|| {
            ScriptError::ContractInteraction(format!("receipt for {} has no block", signed.hash))
        })?;
        self.await_confirmations(signed.hash, mined_in, deadline).await?;

        Ok(DeploymentReceipt {
            address,
            tx_hash: signed.hash,
            gas_used: receipt.gas_used,
        })
    }
}

/// The number of confirmations a transaction mined in `mined_in` has when
/// the chain head is `head`
pub fn confirmation_depth(mined_in: u64, head: u64) -> u64 {
    head.checked_sub(mined_in).map_or(0, |depth| depth + 1)
}

/// Whether a node rejected a broadcast because it already holds the
/// transaction
fn is_already_known(reason: &str) -> bool {
    let reason = reason.to_lowercase();
    ALREADY_KNOWN_ERRORS.iter().any(|known| reason.contains(known))
}
