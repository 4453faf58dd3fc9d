mod render;

use std::env;

use anyhow::{Context, Result};
use ecocoin_core::{Chain, ChainConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Path to an optional JSON file overriding `ChainConfig` defaults.
const CONFIG_ENV: &str = "ECOCOIN_CONFIG";
/// Used when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn load_config() -> Result<ChainConfig> {
    match env::var_os(CONFIG_ENV) {
        Some(path) => ChainConfig::from_path(&path)
            .with_context(|| format!("loading {CONFIG_ENV}={}", path.to_string_lossy())),
        None => Ok(ChainConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    let config = load_config()?;
    let default_miner = config.default_miner.clone();
    info!(
        "{} miner starting: reward {}, difficulty {:?}, {:?} search",
        config.coin_name, config.block_reward, config.difficulty_prefix.as_str(), config.strategy
    );
    let mut chain = Chain::new(config);

    chain.add_pending("Temperature reading: 25.5°C");
    chain.add_pending("User 'Alice' liked 'Bob's' post");
    chain.mine(&default_miner);

    chain.add_pending("Sensor data from device X: 1024lux");
    chain.mine(&default_miner);

    chain.add_pending("Transaction: Bob sent 5 coins to Charlie (not applied to the ledger)");
    chain.mine("another_miner_address");

    for _ in 0..2 {
        let next = chain.last_block().index() + 1;
        chain.add_pending(format!("Arbitrary data for block {next}"));
        chain.mine(&default_miner);
    }

    println!("{}", render::ChainDump(&chain));

    match chain.validate() {
        Ok(()) => println!("Blockchain validity check: true"),
        Err(e) => println!("Blockchain validity check: false ({e})"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn default_filter_shows_info() {
        if env::var_os("RUST_LOG").is_none() {
            assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::INFO));
        }
        assert_eq!(
            EnvFilter::new(DEFAULT_LOG_FILTER).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
