use thiserror::Error;

/// First invariant a chain walk found broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("block {index}: hash mismatch")]
    HashMismatch { index: u64 },
    #[error("block {index}: previous hash mismatch (chain broken)")]
    BrokenLink { index: u64 },
    #[error("block {index}: hash does not meet difficulty prefix {prefix:?}")]
    DifficultyNotMet { index: u64, prefix: String },
}

impl ValidationError {
    /// Index of the offending block.
    pub fn index(&self) -> u64 {
        match self {
            ValidationError::HashMismatch { index }
            | ValidationError::BrokenLink { index }
            | ValidationError::DifficultyNotMet { index, .. } => *index,
        }
    }
}

/// A difficulty prefix no digest could ever start with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidDifficulty {
    #[error("difficulty prefix {0:?} must contain only lowercase hex digits")]
    NotHex(String),
    #[error("difficulty prefix of {len} digits is longer than a {max}-digit hash")]
    TooLong { len: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("a chain needs at least a genesis block")]
    MissingGenesis,
    #[error("block at position {position} has index {found}")]
    OutOfOrder { position: usize, found: u64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
}
