pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;

/// Bumped whenever `canonical_header_bytes` changes shape. Any bump invalidates
/// every previously sealed hash.
pub const HEADER_ENCODING_VERSION: u32 = 2;

pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_MINER: &str = "Genesis_Creator";

pub const EMPTY_PAYLOAD: &str = "No new data";
pub const PAYLOAD_PREFIX: &str = "Data: ";
pub const PAYLOAD_SEPARATOR: &str = ", ";

pub const DEFAULT_COIN_NAME: &str = "EcoCoin";
pub const DEFAULT_MINER_ADDRESS: &str = "your_github_username_miner";
pub const DEFAULT_BLOCK_REWARD: u64 = 10;
pub const DEFAULT_DIFFICULTY_PREFIX: &str = "00";
