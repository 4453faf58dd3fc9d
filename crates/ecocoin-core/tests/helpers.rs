use ecocoin_core::{Block, Chain, ChainConfig, Difficulty};

/// Config with a cheap difficulty so tests mine in a few hundred hashes.
pub fn test_config(prefix_zeros: usize) -> ChainConfig {
    ChainConfig::default().with_difficulty(Difficulty::zeros(prefix_zeros))
}

/// Chain with `n` mined blocks on top of genesis, each carrying one item.
pub fn mined_chain(n: usize) -> Chain {
    let mut chain = Chain::new(test_config(1));
    for i in 0..n {
        chain.add_pending(format!("item {i}"));
        chain.mine("helper-miner");
    }
    chain
}

/// Round-trip the blocks through JSON, letting `edit` tamper with them on the way.
pub fn tampered_blocks(chain: &Chain, edit: impl FnOnce(&mut serde_json::Value)) -> Vec<Block> {
    let mut value = serde_json::to_value(chain.blocks()).expect("blocks serialize");
    edit(&mut value);
    serde_json::from_value(value).expect("tampered blocks still deserialize")
}
