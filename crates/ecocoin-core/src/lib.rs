pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod mine;
pub mod shared;

pub use chain::{genesis_block, join_pending, validate_blocks, Chain, MiningReport};
pub use config::ChainConfig;
pub use error::{ChainError, ConfigError, InvalidDifficulty, ValidationError};
pub use mine::{Difficulty, MiningStrategy, PowOutcome};
pub use shared::SharedChain;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest.
pub type HexHash = String;

pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now()
}

/// Stable textual form of a header timestamp: RFC 3339 UTC with all nine
/// fractional digits, so every representable instant encodes differently.
pub fn canonical_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

// Field declaration order is the serialization order, so it must stay sorted by key.
#[derive(Serialize)]
struct CanonicalHeader<'a> {
    data: &'a str,
    index: u64,
    miner_address: &'a str,
    nonce: u64,
    previous_hash: &'a str,
    timestamp: String,
}

/// Canonical header encoding, version [`constants::HEADER_ENCODING_VERSION`].
///
/// A compact JSON object whose keys appear in lexicographic order:
/// `data`, `index`, `miner_address`, `nonce`, `previous_hash`, `timestamp`.
/// The timestamp is rendered by [`canonical_timestamp`].
pub fn canonical_header_bytes(
    index: u64,
    timestamp: &DateTime<Utc>,
    data: &str,
    previous_hash: &str,
    nonce: u64,
    miner_address: &str,
) -> Vec<u8> {
    let header = CanonicalHeader {
        data,
        index,
        miner_address,
        nonce,
        previous_hash,
        timestamp: canonical_timestamp(timestamp),
    };
    serde_json::to_vec(&header).expect("header of strings and integers always serializes")
}

pub fn header_hash(
    index: u64,
    timestamp: &DateTime<Utc>,
    data: &str,
    previous_hash: &str,
    nonce: u64,
    miner_address: &str,
) -> HexHash {
    let mut hasher = Sha256::new();
    hasher.update(canonical_header_bytes(
        index,
        timestamp,
        data,
        previous_hash,
        nonce,
        miner_address,
    ));
    hex::encode(hasher.finalize())
}

/// A block still being mined. Only the nonce is expected to change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub index: u64,
    pub timestamp: DateTime<Utc>,
    pub data: String,
    pub previous_hash: HexHash,
    pub nonce: u64,
    pub miner_address: String,
}

impl Candidate {
    pub fn new(
        index: u64,
        timestamp: DateTime<Utc>,
        data: impl Into<String>,
        previous_hash: impl Into<String>,
        nonce: u64,
        miner_address: impl Into<String>,
    ) -> Self {
        Self {
            index,
            timestamp,
            data: data.into(),
            previous_hash: previous_hash.into(),
            nonce,
            miner_address: miner_address.into(),
        }
    }

    pub fn derive_hash(&self) -> HexHash {
        self.hash_with_nonce(self.nonce)
    }

    /// Hash of this header as if `nonce` were set, without touching `self`.
    pub fn hash_with_nonce(&self, nonce: u64) -> HexHash {
        header_hash(
            self.index,
            &self.timestamp,
            &self.data,
            &self.previous_hash,
            nonce,
            &self.miner_address,
        )
    }

    /// Seal with the hash of the current fields.
    pub fn seal(self) -> Block {
        let hash = self.derive_hash();
        self.seal_with(hash)
    }

    /// Seal with a hash already computed for the current fields.
    pub(crate) fn seal_with(self, hash: HexHash) -> Block {
        debug_assert_eq!(hash, self.derive_hash());
        Block {
            index: self.index,
            timestamp: self.timestamp,
            data: self.data,
            previous_hash: self.previous_hash,
            nonce: self.nonce,
            miner_address: self.miner_address,
            hash,
        }
    }
}

/// A sealed block. Fields are read-only; the only way in is through
/// [`Candidate::seal`] or deserialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: DateTime<Utc>,
    data: String,
    previous_hash: HexHash,
    nonce: u64,
    miner_address: String,
    hash: HexHash,
}

impl Block {
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn miner_address(&self) -> &str {
        &self.miner_address
    }

    /// The stored content hash.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Recompute the hash from the current header fields.
    pub fn derive_hash(&self) -> HexHash {
        header_hash(
            self.index,
            &self.timestamp,
            &self.data,
            &self.previous_hash,
            self.nonce,
            &self.miner_address,
        )
    }

    pub fn is_hash_consistent(&self) -> bool {
        self.hash == self.derive_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.timestamp_opt(1_600_000_000, 0).unwrap()
    }

    fn candidate() -> Candidate {
        Candidate::new(1, fixed_time(), "Data: A, B", "abc", 42, "m1")
    }

    #[test]
    fn canonical_bytes_example() {
        let c = candidate();
        let bytes = canonical_header_bytes(
            c.index,
            &c.timestamp,
            &c.data,
            &c.previous_hash,
            c.nonce,
            &c.miner_address,
        );
        let expected = r#"{"data":"Data: A, B","index":1,"miner_address":"m1","nonce":42,"previous_hash":"abc","timestamp":"2020-09-13T12:26:40.000000000Z"}"#;
        assert_eq!(String::from_utf8(bytes).unwrap(), expected);
    }

    #[test]
    fn canonical_keys_are_sorted() {
        let c = candidate();
        let bytes = canonical_header_bytes(
            c.index,
            &c.timestamp,
            &c.data,
            &c.previous_hash,
            c.nonce,
            &c.miner_address,
        );
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let encoded_keys: Vec<String> = bytes_keys(&bytes);
        let mut sorted: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        sorted.sort();
        assert_eq!(encoded_keys, sorted);
    }

    // Keys in the order they appear in the raw encoding.
    fn bytes_keys(bytes: &[u8]) -> Vec<String> {
        let text = std::str::from_utf8(bytes).unwrap();
        ["data", "index", "miner_address", "nonce", "previous_hash", "timestamp"]
            .iter()
            .map(|k| (text.find(&format!("\"{k}\":")).unwrap(), k.to_string()))
            .collect::<std::collections::BTreeMap<_, _>>()
            .into_values()
            .collect()
    }

    #[test]
    fn block_hash_example() {
        let expected_hex = "38a8607f7cebc99bb755cff0ab0ef7ff506b1075844d2b619b3a1f656ad30017";
        assert_eq!(candidate().derive_hash(), expected_hex);
        assert_eq!(candidate().derive_hash().len(), constants::HASH_HEX_SIZE);
    }

    #[test]
    fn block_hash_consistency() {
        let c = candidate();
        assert_eq!(c.derive_hash(), c.derive_hash());
        let sealed = c.seal();
        assert_eq!(sealed.hash(), sealed.derive_hash());
        assert!(sealed.is_hash_consistent());
    }

    #[test]
    fn block_hash_changes_with_nonce() {
        let mut c = candidate();
        let hash1 = c.derive_hash();
        c.nonce += 1;
        let hash2 = c.derive_hash();
        assert_ne!(hash1, hash2);
        assert_eq!(hash2, candidate().hash_with_nonce(43));
    }

    #[test]
    fn canonical_timestamp_round_trips() {
        let ts = timestamp_now();
        let text = canonical_timestamp(&ts);
        assert!(text.ends_with('Z'));
        assert_eq!(DateTime::parse_from_rfc3339(&text).unwrap(), ts);
    }

    #[test]
    fn sub_microsecond_timestamp_change_alters_hash() {
        let c = candidate();
        let mut shifted = c.clone();
        shifted.timestamp += chrono::TimeDelta::nanoseconds(123);
        assert_eq!(
            canonical_timestamp(&shifted.timestamp),
            "2020-09-13T12:26:40.000000123Z"
        );
        assert_ne!(c.derive_hash(), shifted.derive_hash());
    }

    #[test]
    fn tampered_nanoseconds_are_inconsistent() {
        let block = candidate().seal();
        let mut value = serde_json::to_value(&block).unwrap();
        value["timestamp"] = serde_json::Value::from("2020-09-13T12:26:40.000000123Z");
        let tampered: Block = serde_json::from_value(value).unwrap();
        assert_ne!(tampered, block);
        assert!(!tampered.is_hash_consistent());
    }

    #[test]
    fn block_serialization_example() {
        let block = candidate().seal();
        let json = serde_json::to_string(&block).unwrap();
        let deserialized: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(block, deserialized);
        assert!(deserialized.is_hash_consistent());
    }

    #[test]
    fn tampered_block_is_inconsistent() {
        let block = candidate().seal();
        let mut value = serde_json::to_value(&block).unwrap();
        value["data"] = serde_json::Value::from("Data: A, C");
        let tampered: Block = serde_json::from_value(value).unwrap();
        assert!(!tampered.is_hash_consistent());
    }
}
