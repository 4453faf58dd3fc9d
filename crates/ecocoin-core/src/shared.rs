use crate::{
    chain::{Chain, MiningReport},
    config::ChainConfig,
    error::ValidationError,
    mine::Difficulty,
    Block,
};
use parking_lot::{Mutex, RwLock};
use std::{collections::BTreeMap, sync::Arc};

/// Cloneable handle to a [`Chain`] for concurrent callers.
///
/// Mining calls queue on a dedicated lock so each one links to the block the
/// previous call appended. The chain itself is locked only to drain the
/// pending pool and later to append, never across the nonce search, so
/// `add_pending` is never stuck behind a miner.
#[derive(Clone)]
pub struct SharedChain {
    chain: Arc<RwLock<Chain>>,
    mining: Arc<Mutex<()>>,
}

impl SharedChain {
    pub fn new(config: ChainConfig) -> Self {
        Self::from_chain(Chain::new(config))
    }

    pub fn from_chain(chain: Chain) -> Self {
        Self {
            chain: Arc::new(RwLock::new(chain)),
            mining: Arc::new(Mutex::new(())),
        }
    }

    pub fn add_pending(&self, data: impl Into<String>) {
        self.chain.write().add_pending(data);
    }

    pub fn mine(&self, miner_address: &str) -> Block {
        self.mine_with_report(miner_address).block
    }

    pub fn mine_with_report(&self, miner_address: &str) -> MiningReport {
        let _turn = self.mining.lock();
        // Snapshot-and-clear of the pool happens under the write lock.
        let job = self.chain.write().next_job(miner_address);
        let (outcome, elapsed) = job.run();
        self.chain.write().commit(job.candidate, outcome, elapsed)
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) {
        self.chain.write().set_difficulty(difficulty);
    }

    pub fn balances(&self) -> BTreeMap<String, u128> {
        self.chain.read().balances().clone()
    }

    pub fn balance_of(&self, miner: &str) -> u128 {
        self.chain.read().balance_of(miner)
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.chain.read().blocks().to_vec()
    }

    pub fn len(&self) -> usize {
        self.chain.read().len()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.chain.read().validate()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Run `f` against a consistent view of the chain.
    pub fn read<R>(&self, f: impl FnOnce(&Chain) -> R) -> R {
        f(&*self.chain.read())
    }
}
