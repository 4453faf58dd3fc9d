//! Plain-text dump of a chain and its ledger.
use std::fmt;

use ecocoin_core::{Block, Chain};

const RULE_WIDTH: usize = 50;
const SHORT_HASH: usize = 15;

fn short(hash: &str) -> &str {
    hash.get(..SHORT_HASH).unwrap_or(hash)
}

fn rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "-".repeat(RULE_WIDTH))
}

/// One block as a few indented lines.
pub struct BlockDump<'a>(pub &'a Block);

impl fmt::Display for BlockDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let block = self.0;
        writeln!(
            f,
            "Block {} | Time: {} | Miner: {}",
            block.index(),
            block.timestamp().format("%Y-%m-%d %H:%M:%S"),
            block.miner_address()
        )?;
        writeln!(f, "  Data: {}", block.data())?;
        writeln!(f, "  PrevHash: {}...", short(block.previous_hash()))?;
        writeln!(f, "  Hash: {}... ({})", short(block.hash()), block.hash())?;
        writeln!(f, "  Nonce: {}", block.nonce())?;
        rule(f)
    }
}

/// Every block followed by the balance ledger.
pub struct ChainDump<'a>(pub &'a Chain);

impl fmt::Display for ChainDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.0;
        let coin = &chain.config().coin_name;
        writeln!(f, "--- Current {coin} Blockchain (Length: {}) ---", chain.len())?;
        for block in chain.blocks() {
            write!(f, "{}", BlockDump(block))?;
        }
        writeln!(f, "--- Balances ---")?;
        for (address, balance) in chain.balances() {
            writeln!(f, "{address}: {balance} {coin}")?;
        }
        rule(f)
    }
}
