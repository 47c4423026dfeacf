//! In-memory chains for exercising the deployment orchestrator and the RPC
//! chain's submission logic

use std::cell::RefCell;

use alloy::primitives::{keccak256, Address, Bytes, TxHash, B256};

use crate::{
    chain::{
        CreationReceipt, DeployChain, DeploymentReceipt, DeploymentTx, NodeClient, SignedCreation,
    },
    errors::ScriptError,
};

// --------------
// | Mock chain |
// --------------

/// A transaction mined by the mock chain
#[derive(Clone, Debug)]
pub struct MinedTx {
    /// The contract name, or `None` for an unrelated transaction
    pub name: Option<String>,
    /// The nonce the transaction consumed
    pub nonce: u64,
    /// The init code, empty for unrelated transactions
    pub init_code: Bytes,
    /// The address code was placed at, if any
    pub created: Option<Address>,
}

/// The mutable state of a [`MockChain`]
#[derive(Default)]
struct State {
    /// The deployer's transaction count
    nonce: u64,
    /// The number of upcoming nonce queries that fail
    failing_queries: u32,
    /// The number of deployments submitted, mined or not
    submissions: u32,
    /// The number of deployments mined
    deployments: u32,
    /// Every mined transaction, in order
    mined: Vec<MinedTx>,
}

/// A single-account chain that mines every transaction immediately
pub struct MockChain {
    /// The deployer address
    deployer: Address,
    /// Inject an unrelated transaction from the deployer after the given
    /// number of deployments
    interloper_after: Option<u32>,
    /// Revert the mined deployment with the given 1-based index
    revert_at: Option<u32>,
    /// Reject the submission with the given 1-based index before it is
    /// mined, leaving the nonce unspent
    reject_at: Option<u32>,
    /// Place the deployment with the given 1-based index at an address that
    /// does not follow from its nonce
    misroute_at: Option<u32>,
    /// The mutable chain state
    state: RefCell<State>,
}

impl MockChain {
    /// A chain where `deployer` has sent `nonce` transactions
    pub fn new(deployer: Address, nonce: u64) -> Self {
        Self {
            deployer,
            interloper_after: None,
            revert_at: None,
            reject_at: None,
            misroute_at: None,
            state: RefCell::new(State {
                nonce,
                ..Default::default()
            }),
        }
    }

    /// Fail the next `n` nonce queries with a transient error
    pub fn with_failing_queries(self, n: u32) -> Self {
        self.state.borrow_mut().failing_queries = n;
        self
    }

    /// Send an unrelated deployer transaction once `n` deployments are mined
    pub fn with_interloper_after(mut self, n: u32) -> Self {
        self.interloper_after = Some(n);
        self
    }

    /// Revert the `n`th mined deployment (1-based)
    pub fn with_revert_at(mut self, n: u32) -> Self {
        self.revert_at = Some(n);
        self
    }

    /// Reject the `n`th submission (1-based) without mining it
    pub fn with_rejection_at(mut self, n: u32) -> Self {
        self.reject_at = Some(n);
        self
    }

    /// Place the `n`th deployment (1-based) at an unexpected address
    pub fn with_misrouted_deployment_at(mut self, n: u32) -> Self {
        self.misroute_at = Some(n);
        self
    }

    /// The transactions mined so far, in order
    pub fn mined(&self) -> Vec<MinedTx> {
        self.state.borrow().mined.clone()
    }

    /// The deployments mined so far, in order
    pub fn deployments(&self) -> Vec<MinedTx> {
        self.mined().into_iter().filter(|tx| tx.name.is_some()).collect()
    }
}

impl DeployChain for MockChain {
    fn deployer(&self) -> Address {
        self.deployer
    }

    async fn transaction_count(&self) -> Result<u64, ScriptError> {
        let mut state = self.state.borrow_mut();
        if state.failing_queries > 0 {
            state.failing_queries -= 1;
            return Err(ScriptError::ChainQuery("connection refused".to_string()));
        }
        Ok(state.nonce)
    }

    async fn send_deployment(&self, tx: &DeploymentTx) -> Result<DeploymentReceipt, ScriptError> {
        let mut state = self.state.borrow_mut();
        if tx.nonce != state.nonce {
            return Err(ScriptError::TransactionReverted {
                reason: format!("nonce mismatch: tx {} account {}", tx.nonce, state.nonce),
            });
        }

        state.submissions += 1;
        if self.reject_at == Some(state.submissions) {
            return Err(ScriptError::TransactionReverted {
                reason: "insufficient funds for gas * price + value".to_string(),
            });
        }

        state.deployments += 1;
        let index = state.deployments;
        let nonce = state.nonce;
        state.nonce += 1;

        let reverted = self.revert_at == Some(index);
        let created = if reverted {
            None
        } else if self.misroute_at == Some(index) {
            Some(Address::repeat_byte(0xee))
        } else {
            Some(self.deployer.create(nonce))
        };

        state.mined.push(MinedTx {
            name: Some(tx.name.clone()),
            nonce,
            init_code: tx.init_code.clone(),
            created,
        });

        if self.interloper_after == Some(index) {
            let nonce = state.nonce;
            state.nonce += 1;
            state.mined.push(MinedTx {
                name: None,
                nonce,
                init_code: Bytes::new(),
                created: None,
            });
        }

        match created {
            Some(address) => Ok(DeploymentReceipt {
                address,
                tx_hash: TxHash::from(B256::with_last_byte(index as u8)),
                gas_used: 21_000,
            }),
            None => Err(ScriptError::TransactionReverted {
                reason: "constructor reverted".to_string(),
            }),
        }
    }
}

// -------------
// | Mock node |
// -------------

/// How the mock node mishandles a broadcast
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastFault {
    /// The transaction is mined but the response never arrives
    LostResponse,
    /// The request never reaches the node
    Unreachable,
    /// The transaction enters the pool but the response never arrives
    Pooled,
}

/// The mutable state of a [`MockNode`]
#[derive(Default)]
struct NodeState {
    /// The signer's transaction count
    nonce: u64,
    /// The latest block number
    head: u64,
    /// The number of upcoming nonce queries that fail
    failing_nonce_queries: u32,
    /// The number of broadcasts received, including failed ones
    broadcasts: u32,
    /// The number of block number queries answered
    head_queries: u32,
    /// Signed transactions, as (raw, hash, nonce)
    signed: Vec<(Bytes, TxHash, u64)>,
    /// Hashes of pooled, unmined transactions, with their nonces
    pool: Vec<(TxHash, u64)>,
    /// Receipts of mined transactions by hash
    receipts: Vec<(TxHash, CreationReceipt)>,
}

/// A single-signer node that mines accepted transactions into blocks of
/// their own
pub struct MockNode {
    /// The signer address
    signer: Address,
    /// Faults applied to broadcasts, by 1-based broadcast index
    faults: Vec<(u32, BroadcastFault)>,
    /// Whether another transaction takes the signer's nonce whenever a
    /// nonce query or broadcast fails
    interloper_on_failure: bool,
    /// Whether mined creations revert
    revert: bool,
    /// Whether accepted transactions stay in the pool forever
    never_mine: bool,
    /// How many blocks the head advances by on each block number query
    blocks_per_head_query: u64,
    /// The mutable node state
    state: RefCell<NodeState>,
}

impl MockNode {
    /// A node where `signer` has sent `nonce` transactions
    pub fn new(signer: Address, nonce: u64) -> Self {
        Self {
            signer,
            faults: Vec::new(),
            interloper_on_failure: false,
            revert: false,
            never_mine: false,
            blocks_per_head_query: 0,
            state: RefCell::new(NodeState {
                nonce,
                ..Default::default()
            }),
        }
    }

    /// The hash the mock assigns to a signed creation
    pub fn hash_of(tx: &DeploymentTx) -> TxHash {
        let mut preimage = tx.init_code.to_vec();
        preimage.extend_from_slice(&tx.nonce.to_be_bytes());
        keccak256(preimage)
    }

    /// Mishandle the `n`th broadcast (1-based)
    pub fn with_broadcast_fault(mut self, n: u32, fault: BroadcastFault) -> Self {
        self.faults.push((n, fault));
        self
    }

    /// Fail the next `n` nonce queries with a transient error
    pub fn with_failing_nonce_queries(self, n: u32) -> Self {
        self.state.borrow_mut().failing_nonce_queries = n;
        self
    }

    /// Let another transaction take the signer's nonce on each failure
    pub fn with_interloper_on_failure(mut self) -> Self {
        self.interloper_on_failure = true;
        self
    }

    /// Revert every mined creation
    pub fn with_reverting_creations(mut self) -> Self {
        self.revert = true;
        self
    }

    /// Accept broadcasts without ever mining them
    pub fn with_unmined_broadcasts(mut self) -> Self {
        self.never_mine = true;
        self
    }

    /// Advance the head by `n` blocks on each block number query
    pub fn with_blocks_per_head_query(mut self, n: u64) -> Self {
        self.blocks_per_head_query = n;
        self
    }

    /// The number of broadcasts received
    pub fn broadcasts(&self) -> u32 {
        self.state.borrow().broadcasts
    }

    /// The number of the signer's transactions mined with a receipt
    pub fn mined(&self) -> usize {
        self.state.borrow().receipts.len()
    }

    /// The number of block number queries answered
    pub fn head_queries(&self) -> u32 {
        self.state.borrow().head_queries
    }

    /// Mine a transaction of the signer's into a new block
    fn mine(&self, state: &mut NodeState, hash: TxHash, nonce: u64) {
        state.head += 1;
        state.nonce = nonce + 1;
        let receipt = CreationReceipt {
            status: !self.revert,
            contract_address: (!self.revert).then(|| self.signer.create(nonce)),
            block_number: Some(state.head),
            gas_used: 21_000,
        };
        state.receipts.push((hash, receipt));
    }

    /// Let an unrelated transaction take the signer's nonce
    fn interlope(&self, state: &mut NodeState) {
        if self.interloper_on_failure {
            state.head += 1;
            state.nonce += 1;
        }
    }

    /// Mine every pooled transaction
    fn mine_pool(&self, state: &mut NodeState) {
        if self.never_mine {
            return;
        }
        for (hash, nonce) in std::mem::take(&mut state.pool) {
            self.mine(state, hash, nonce);
        }
    }
}

impl NodeClient for MockNode {
    fn signer(&self) -> Address {
        self.signer
    }

    async fn transaction_count(&self) -> Result<u64, ScriptError> {
        let mut state = self.state.borrow_mut();
        if state.failing_nonce_queries > 0 {
            state.failing_nonce_queries -= 1;
            self.interlope(&mut state);
            return Err(ScriptError::ChainQuery("connection reset".to_string()));
        }
        Ok(state.nonce)
    }

    async fn block_number(&self) -> Result<u64, ScriptError> {
        let mut state = self.state.borrow_mut();
        state.head_queries += 1;
        state.head += self.blocks_per_head_query;
        Ok(state.head)
    }

    async fn sign_creation(&self, tx: &DeploymentTx) -> Result<SignedCreation, ScriptError> {
        let hash = Self::hash_of(tx);
        let raw = tx.init_code.clone();
        self.state
            .borrow_mut()
            .signed
            .push((raw.clone(), hash, tx.nonce));
        Ok(SignedCreation { hash, raw })
    }

    async fn broadcast(&self, raw: &Bytes) -> Result<(), ScriptError> {
        let mut state = self.state.borrow_mut();
        state.broadcasts += 1;
        let index = state.broadcasts;

        let (hash, nonce) = state
            .signed
            .iter()
            .find(|(signed, ..)| signed == raw)
            .map(|(_, hash, nonce)| (*hash, *nonce))
            .ok_or_else(|| ScriptError::ChainQuery("unknown transaction".to_string()))?;

        if state.pool.iter().any(|(pooled, _)| *pooled == hash) {
            return Err(ScriptError::TransactionReverted {
                reason: "already known".to_string(),
            });
        }

        let fault = self.faults.iter().find(|(n, _)| *n == index).map(|(_, f)| *f);
        match fault {
            Some(BroadcastFault::Unreachable) => {
                self.interlope(&mut state);
                Err(ScriptError::ChainQuery("connection refused".to_string()))
            }
            Some(BroadcastFault::LostResponse) => {
                self.mine(&mut state, hash, nonce);
                Err(ScriptError::ChainQuery("response timed out".to_string()))
            }
            Some(BroadcastFault::Pooled) => {
                state.pool.push((hash, nonce));
                Err(ScriptError::ChainQuery("response timed out".to_string()))
            }
            None if self.never_mine => {
                state.pool.push((hash, nonce));
                Ok(())
            }
            None => {
                self.mine(&mut state, hash, nonce);
                Ok(())
            }
        }
    }

    async fn creation_receipt(&self, hash: TxHash) -> Result<Option<CreationReceipt>, ScriptError> {
        let mut state = self.state.borrow_mut();
        self.mine_pool(&mut state);
        Ok(state
            .receipts
            .iter()
            .find(|(mined, _)| *mined == hash)
            .map(|(_, receipt)| receipt.clone()))
    }
}
