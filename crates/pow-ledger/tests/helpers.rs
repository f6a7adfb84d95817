#![allow(dead_code)]

use pow_ledger::{Chain, ChainConfig, Transaction};
use rand::Rng;
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

pub const TEST_DIFFICULTY: usize = 2;

pub fn init_tracing() {
    // Tests share one process, so only the first call installs the subscriber.
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn create_chain() -> Chain {
    init_tracing();
    Chain::from_config(&ChainConfig::new(TEST_DIFFICULTY)).expect("valid test difficulty")
}

pub fn random_transfer<R: Rng>(rng: &mut R) -> Transaction {
    json!({
        "from": format!("addr_{}", rng.gen_range(0..1000)),
        "to": format!("addr_{}", rng.gen_range(0..1000)),
        "amount": rng.gen_range(1..10_000u64),
    })
}

/// Asserts linkage, index sequence and proof validity for every adjacent pair.
pub fn assert_chain_invariants(chain: &Chain) {
    let blocks = chain.blocks();
    for (i, pair) in blocks.windows(2).enumerate() {
        let (prev, block) = (&pair[0], &pair[1]);
        assert_eq!(block.previous_hash(), prev.hash(), "broken link at {}", i + 1);
        assert_eq!(block.index(), prev.index() + 1, "index gap at {}", i + 1);
        assert!(
            chain.is_valid_proof(block, block.hash()),
            "invalid proof at {}",
            i + 1
        );
    }
    assert!(chain.validate().is_ok());
}
