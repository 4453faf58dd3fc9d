use crate::{
    constants::{DEFAULT_BLOCK_REWARD, DEFAULT_COIN_NAME, DEFAULT_MINER_ADDRESS},
    error::ConfigError,
    mine::{Difficulty, MiningStrategy},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Everything a [`crate::Chain`] is parameterised by.
///
/// Missing fields fall back to their defaults when loaded from JSON, e.g.
/// `{"block_reward": 25, "difficulty_prefix": "000"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Label used in the genesis data and in reports.
    pub coin_name: String,
    /// Miner credited by `Chain::mine_default`.
    pub default_miner: String,
    /// Coins credited per mined block.
    pub block_reward: u64,
    /// Initial difficulty; can be changed later with `Chain::set_difficulty`.
    pub difficulty_prefix: Difficulty,
    pub strategy: MiningStrategy,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            coin_name: DEFAULT_COIN_NAME.to_string(),
            default_miner: DEFAULT_MINER_ADDRESS.to_string(),
            block_reward: DEFAULT_BLOCK_REWARD,
            difficulty_prefix: Difficulty::default(),
            strategy: MiningStrategy::default(),
        }
    }
}

impl ChainConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_coin_name(mut self, coin_name: impl Into<String>) -> Self {
        self.coin_name = coin_name.into();
        self
    }

    pub fn with_default_miner(mut self, miner: impl Into<String>) -> Self {
        self.default_miner = miner.into();
        self
    }

    pub fn with_block_reward(mut self, reward: u64) -> Self {
        self.block_reward = reward;
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty_prefix = difficulty;
        self
    }

    pub fn with_strategy(mut self, strategy: MiningStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
