use crate::{
    config::ChainConfig,
    constants::{EMPTY_PAYLOAD, GENESIS_MINER, GENESIS_PREVIOUS_HASH, PAYLOAD_PREFIX, PAYLOAD_SEPARATOR},
    error::{ChainError, ValidationError},
    mine::{self, Difficulty, MiningStrategy, PowOutcome},
    timestamp_now, Block, Candidate,
};
use std::{
    collections::BTreeMap,
    mem,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

/// Genesis block for `coin_name`. Hashed directly, no proof of work.
pub fn genesis_block(coin_name: &str) -> Block {
    Candidate::new(
        0,
        timestamp_now(),
        format!("Genesis Block of {coin_name} Network"),
        GENESIS_PREVIOUS_HASH,
        0,
        GENESIS_MINER,
    )
    .seal()
}

/// Collapse pending items into one block payload, preserving arrival order.
pub fn join_pending(items: &[String]) -> String {
    if items.is_empty() {
        EMPTY_PAYLOAD.to_string()
    } else {
        format!("{PAYLOAD_PREFIX}{}", items.join(PAYLOAD_SEPARATOR))
    }
}

/// Walk `blocks[1..]` checking stored hash, back-link and difficulty, in that
/// order. Genesis is trusted as-is.
pub fn validate_blocks(blocks: &[Block], difficulty: &Difficulty) -> Result<(), ValidationError> {
    for pair in blocks.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let index = current.index();

        if !current.is_hash_consistent() {
            return Err(ValidationError::HashMismatch { index });
        }
        if current.previous_hash() != previous.hash() {
            return Err(ValidationError::BrokenLink { index });
        }
        if !difficulty.is_met_by(current.hash()) {
            return Err(ValidationError::DifficultyNotMet {
                index,
                prefix: difficulty.to_string(),
            });
        }
    }
    Ok(())
}

/// Add `reward` to `miner`'s balance and return the new total.
///
/// Balances are `u128`: a chain holds at most `u64::MAX` blocks, each paying
/// at most `u64::MAX`, so the sum never reaches the saturation point.
fn credit(balances: &mut BTreeMap<String, u128>, miner: &str, reward: u64) -> u128 {
    let balance = balances.entry(miner.to_string()).or_insert(0);
    *balance = balance.saturating_add(u128::from(reward));
    *balance
}

/// Result of one mining call, with the search statistics.
#[derive(Clone, Debug)]
pub struct MiningReport {
    pub block: Block,
    pub hashes_tried: u64,
    pub elapsed: Duration,
    pub reward: u64,
    /// Miner balance after the reward.
    pub balance: u128,
}

impl MiningReport {
    /// Hashes per second; zero when the search was too quick to time.
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.hashes_tried as f64 / secs
        } else {
            0.0
        }
    }
}

/// Everything the nonce search needs, detached from the chain.
#[derive(Clone, Debug)]
pub(crate) struct MiningJob {
    pub(crate) candidate: Candidate,
    pub(crate) difficulty: Difficulty,
    pub(crate) strategy: MiningStrategy,
}

impl MiningJob {
    pub(crate) fn run(&self) -> (PowOutcome, Duration) {
        info!(
            "Mining block {} for {} (difficulty {:?}, ~{} attempts expected)",
            self.candidate.index,
            self.candidate.miner_address,
            self.difficulty.as_str(),
            mine::expected_attempts(&self.difficulty)
        );
        let started = Instant::now();
        let outcome = mine::search(&self.candidate, &self.difficulty, self.strategy);
        (outcome, started.elapsed())
    }
}

/// In-memory chain: sealed blocks, the pending pool and the reward ledger.
#[derive(Clone, Debug)]
pub struct Chain {
    config: ChainConfig,
    blocks: Vec<Block>,
    pending: Vec<String>,
    balances: BTreeMap<String, u128>,
    difficulty: Difficulty,
}

impl Chain {
    pub fn new(config: ChainConfig) -> Self {
        let genesis = genesis_block(&config.coin_name);
        info!("Genesis block created: {}", genesis.hash());
        Self {
            difficulty: config.difficulty_prefix.clone(),
            config,
            blocks: vec![genesis],
            pending: Vec::new(),
            balances: BTreeMap::new(),
        }
    }

    /// Adopt an externally supplied block sequence, e.g. one read back from JSON.
    ///
    /// Indices must run 0..n. Nothing else is checked here; call
    /// [`Chain::validate`] for that. Balances are rebuilt by crediting the
    /// configured reward for every non-genesis block.
    pub fn from_blocks(config: ChainConfig, blocks: Vec<Block>) -> Result<Self, ChainError> {
        if blocks.is_empty() {
            return Err(ChainError::MissingGenesis);
        }
        if let Some((position, block)) = blocks
            .iter()
            .enumerate()
            .find(|(position, block)| block.index() != *position as u64)
        {
            return Err(ChainError::OutOfOrder {
                position,
                found: block.index(),
            });
        }

        let mut balances = BTreeMap::new();
        for block in &blocks[1..] {
            credit(&mut balances, block.miner_address(), config.block_reward);
        }

        Ok(Self {
            difficulty: config.difficulty_prefix.clone(),
            config,
            blocks,
            pending: Vec::new(),
            balances,
        })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn last_block(&self) -> &Block {
        // never empty: genesis is pushed on construction
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn balances(&self) -> &BTreeMap<String, u128> {
        &self.balances
    }

    pub fn balance_of(&self, miner: &str) -> u128 {
        self.balances.get(miner).copied().unwrap_or(0)
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    /// Applies to later mining calls and to every later validation,
    /// including of blocks already sealed.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        debug!("Difficulty changed from {:?} to {:?}", self.difficulty.as_str(), difficulty.as_str());
        self.difficulty = difficulty;
    }

    pub fn add_pending(&mut self, data: impl Into<String>) {
        let data = data.into();
        debug!("{:?} added to pending data", data);
        self.pending.push(data);
    }

    pub fn mine(&mut self, miner_address: &str) -> Block {
        self.mine_with_report(miner_address).block
    }

    pub fn mine_default(&mut self) -> Block {
        let miner = self.config.default_miner.clone();
        self.mine(&miner)
    }

    pub fn mine_with_report(&mut self, miner_address: &str) -> MiningReport {
        let job = self.next_job(miner_address);
        let (outcome, elapsed) = job.run();
        self.commit(job.candidate, outcome, elapsed)
    }

    /// Drain the pending pool and build the candidate for the next block.
    pub(crate) fn next_job(&mut self, miner_address: &str) -> MiningJob {
        if self.pending.is_empty() {
            debug!("No pending data; mining an empty block");
        }
        let items = mem::take(&mut self.pending);
        let candidate = Candidate::new(
            self.blocks.len() as u64,
            timestamp_now(),
            join_pending(&items),
            self.last_block().hash(),
            0,
            miner_address,
        );
        MiningJob {
            candidate,
            difficulty: self.difficulty.clone(),
            strategy: self.config.strategy,
        }
    }

    /// Seal the mined candidate, append it and credit its miner.
    ///
    /// The candidate must have been built by `next_job` on this chain with no
    /// other block committed in between.
    pub(crate) fn commit(
        &mut self,
        mut candidate: Candidate,
        outcome: PowOutcome,
        elapsed: Duration,
    ) -> MiningReport {
        debug_assert_eq!(candidate.index, self.blocks.len() as u64);
        debug_assert_eq!(candidate.previous_hash, self.last_block().hash());

        candidate.nonce = outcome.nonce;
        let block = candidate.seal_with(outcome.hash);
        self.blocks.push(block.clone());

        let reward = self.config.block_reward;
        let balance = credit(&mut self.balances, block.miner_address(), reward);

        let report = MiningReport {
            block,
            hashes_tried: outcome.hashes_tried,
            elapsed,
            reward,
            balance,
        };
        info!(
            "Mined block {} with nonce {} and hash {} ({} hashes in {:.2?}, {:.2} H/s)",
            report.block.index(),
            report.block.nonce(),
            report.block.hash(),
            report.hashes_tried,
            report.elapsed,
            report.hash_rate()
        );
        info!(
            "Reward: {} {} to {}, new balance {}",
            reward,
            self.config.coin_name,
            report.block.miner_address(),
            report.balance
        );
        report
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_blocks(&self.blocks, &self.difficulty).inspect_err(|e| warn!("Chain invalid: {e}"))
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}
