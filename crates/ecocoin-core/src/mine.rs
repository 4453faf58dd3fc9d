use crate::{constants::HASH_HEX_SIZE, error::InvalidDifficulty, Candidate, HexHash};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};

/// Required leading substring of a valid header hash.
///
/// Only lowercase hex digits, at most as many as a digest has. Anything else
/// can never match and would make the search loop forever.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Difficulty(String);

impl Difficulty {
    pub fn new(prefix: impl Into<String>) -> Result<Self, InvalidDifficulty> {
        let prefix = prefix.into();
        if prefix.len() > HASH_HEX_SIZE {
            return Err(InvalidDifficulty::TooLong {
                len: prefix.len(),
                max: HASH_HEX_SIZE,
            });
        }
        if !prefix
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(InvalidDifficulty::NotHex(prefix));
        }
        Ok(Self(prefix))
    }

    /// `n` leading zeros, capped at the digest length.
    pub fn zeros(n: usize) -> Self {
        Self("0".repeat(n.min(HASH_HEX_SIZE)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_met_by(&self, hash: &str) -> bool {
        hash.starts_with(&self.0)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(crate::constants::DEFAULT_DIFFICULTY_PREFIX.to_string())
    }
}

impl FromStr for Difficulty {
    type Err = InvalidDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Difficulty {
    type Error = InvalidDifficulty;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for String {
    fn from(value: Difficulty) -> Self {
        value.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Expected number of digests before a uniform hash meets `difficulty`.
pub fn expected_attempts(difficulty: &Difficulty) -> f64 {
    16f64.powi(difficulty.len() as i32)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningStrategy {
    /// Nonces tried in order from the candidate's nonce. Reproducible.
    #[default]
    Sequential,
    /// Nonce space split across the rayon pool; whichever worker hits first wins.
    Parallel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PowOutcome {
    pub nonce: u64,
    pub hash: HexHash,
    pub hashes_tried: u64,
}

/// Search nonces until the candidate's hash starts with `difficulty`.
///
/// There is no bound on the search; it returns only on success.
pub fn search(candidate: &Candidate, difficulty: &Difficulty, strategy: MiningStrategy) -> PowOutcome {
    match strategy {
        MiningStrategy::Sequential => search_sequential(candidate, difficulty),
        MiningStrategy::Parallel => search_parallel(candidate, difficulty),
    }
}

pub fn search_sequential(candidate: &Candidate, difficulty: &Difficulty) -> PowOutcome {
    let mut nonce = candidate.nonce;
    let mut hashes_tried = 0u64;
    loop {
        let hash = candidate.hash_with_nonce(nonce);
        hashes_tried += 1;
        if difficulty.is_met_by(&hash) {
            return PowOutcome {
                nonce,
                hash,
                hashes_tried,
            };
        }
        nonce = nonce.wrapping_add(1);
    }
}

pub fn search_parallel(candidate: &Candidate, difficulty: &Difficulty) -> PowOutcome {
    let tried = AtomicU64::new(0);

    // Rayon splits the range across the pool and stops the others once one finds a match.
    let found = (candidate.nonce..=u64::MAX)
        .into_par_iter()
        .chain(0..candidate.nonce)
        .find_map_any(|nonce| {
            tried.fetch_add(1, Ordering::Relaxed);
            let hash = candidate.hash_with_nonce(nonce);
            difficulty.is_met_by(&hash).then_some((nonce, hash))
        });

    match found {
        Some((nonce, hash)) => PowOutcome {
            nonce,
            hash,
            hashes_tried: tried.load(Ordering::Relaxed),
        },
        // Every nonce failed; the timestamp is the only other free field.
        None => {
            let mut retry = candidate.clone();
            retry.timestamp = crate::timestamp_now();
            search_parallel(&retry, difficulty)
        }
    }
}
