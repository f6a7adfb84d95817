use crate::config::{validate_difficulty, ChainConfig};
use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::error::{ChainError, Result};
use crate::{pow, Block, HexDigest, SealedBlock, Transaction};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// The chain engine: accepted blocks, the pending transaction pool and the
/// difficulty they are checked against.
///
/// `Chain` is single-threaded. Hosts that share one engine between threads
/// should go through [`crate::SharedChain`].
#[derive(Clone, Debug)]
pub struct Chain {
    blocks: Vec<SealedBlock>,
    pool: Vec<Transaction>,
    difficulty: usize,
    max_attempts: Option<u64>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::seeded(&ChainConfig::default())
    }
}

impl Chain {
    pub fn new(difficulty: usize) -> Result<Self> {
        Self::from_config(&ChainConfig::new(difficulty))
    }

    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::seeded(config))
    }

    fn seeded(config: &ChainConfig) -> Self {
        let mut chain = Self {
            blocks: Vec::new(),
            pool: Vec::new(),
            difficulty: config.difficulty,
            max_attempts: config.max_attempts,
        };
        chain.initialize();
        chain
    }

    /// Rebuilds an engine from previously exported blocks. The blocks must
    /// form a valid chain under `difficulty`.
    pub fn restore(blocks: Vec<SealedBlock>, difficulty: usize) -> Result<Self> {
        validate_difficulty(difficulty)?;
        let chain = Self {
            blocks,
            pool: Vec::new(),
            difficulty,
            max_attempts: None,
        };
        chain.validate()?;
        info!(height = chain.last_block().index(), "chain restored");
        Ok(chain)
    }

    fn initialize(&mut self) {
        let genesis = Block::genesis(unix_now());
        info!(hash = %genesis.hash(), "genesis block created");
        self.blocks.push(genesis);
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn blocks(&self) -> &[SealedBlock] {
        &self.blocks
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pool
    }

    pub fn last_block(&self) -> &SealedBlock {
        self.blocks
            .last()
            .expect("chain always holds the genesis block")
    }

    /// Queues a transaction for the next mined block. Contents are not inspected.
    pub fn submit_transaction(&mut self, transaction: impl Into<Transaction>) {
        self.pool.push(transaction.into());
        debug!(pending = self.pool.len(), "transaction submitted");
    }

    pub fn find_proof_of_work(&self, candidate: &mut Block) -> HexDigest {
        pow::find_proof_of_work(candidate, self.difficulty)
    }

    /// A proof is valid when it meets the difficulty and is the hash of the
    /// block's current fields.
    pub fn is_valid_proof(&self, block: &Block, candidate_hash: &str) -> bool {
        pow::meets_difficulty(candidate_hash, self.difficulty)
            && candidate_hash == block.compute_hash()
    }

    pub fn add_block(&mut self, block: Block, proof: HexDigest) -> bool {
        self.try_add_block(block, proof).is_ok()
    }

    /// Appends `block` sealed with `proof` and returns its index. The chain is
    /// untouched when the block does not extend the tip or the proof fails.
    pub fn try_add_block(&mut self, block: Block, proof: HexDigest) -> Result<u64> {
        let tip = self.last_block();
        if block.previous_hash() != tip.hash() {
            warn!(
                index = block.index(),
                expected = %tip.hash(),
                found = %block.previous_hash(),
                "rejected stale block"
            );
            return Err(ChainError::StaleBlock {
                index: block.index(),
                expected: tip.hash().to_string(),
                found: block.previous_hash().to_string(),
            });
        }
        let expected_index = tip.index() + 1;
        if block.index() != expected_index {
            warn!(
                expected = expected_index,
                found = block.index(),
                "rejected block with unexpected index"
            );
            return Err(ChainError::UnexpectedIndex {
                expected: expected_index,
                found: block.index(),
            });
        }
        if !self.is_valid_proof(&block, &proof) {
            warn!(index = block.index(), %proof, "rejected block with invalid proof");
            return Err(ChainError::InvalidProof {
                index: block.index(),
            });
        }

        let index = block.index();
        info!(index, hash = %proof, txs = block.transactions().len(), "block appended");
        self.blocks.push(SealedBlock::new(block, proof));
        Ok(index)
    }

    /// Snapshots the tip and the whole pool into a block ready for the search.
    pub fn build_candidate(&self) -> Result<Block> {
        if self.pool.is_empty() {
            return Err(ChainError::EmptyPool);
        }
        let tip = self.last_block();
        let candidate = Block::new(tip.index() + 1, self.pool.clone(), unix_now(), tip.hash());
        debug!(
            index = candidate.index(),
            txs = candidate.transactions().len(),
            "candidate block built"
        );
        Ok(candidate)
    }

    /// Mines the pending pool into a new block. Returns the new block's
    /// index, or `None` when nothing was pending or the block was rejected.
    pub fn mine(&mut self) -> Option<u64> {
        match self.try_mine() {
            Ok(index) => Some(index),
            Err(err) => {
                debug!(%err, "no block produced");
                None
            }
        }
    }

    pub fn try_mine(&mut self) -> Result<u64> {
        let mut candidate = self.build_candidate()?;
        let proof = pow::search(&mut candidate, self.difficulty, self.max_attempts)?;
        self.commit_mined(candidate, proof)
    }

    pub(crate) fn search_params(&self) -> (usize, Option<u64>) {
        (self.difficulty, self.max_attempts)
    }

    /// Appends a mined candidate and drains the transactions it carries.
    /// Those are always a prefix of the pool: the pool only grows while the
    /// tip stays where the candidate was built from.
    pub(crate) fn commit_mined(&mut self, candidate: Block, proof: HexDigest) -> Result<u64> {
        let included = candidate.transactions().len();
        let index = self.try_add_block(candidate, proof)?;
        self.pool.drain(..included);
        Ok(index)
    }

    /// Re-checks every chain invariant from genesis to tip.
    pub fn validate(&self) -> Result<()> {
        let genesis = self.blocks.first().ok_or(ChainError::BrokenLink { index: 0 })?;
        if genesis.index() != 0
            || genesis.previous_hash() != GENESIS_PREVIOUS_HASH
            || !genesis.transactions().is_empty()
            || genesis.hash() != genesis.compute_hash()
        {
            return Err(ChainError::BrokenLink { index: 0 });
        }

        for pair in self.blocks.windows(2) {
            let (prev, block) = (&pair[0], &pair[1]);
            if block.previous_hash() != prev.hash() {
                return Err(ChainError::BrokenLink {
                    index: block.index(),
                });
            }
            if block.index() != prev.index() + 1 {
                return Err(ChainError::UnexpectedIndex {
                    expected: prev.index() + 1,
                    found: block.index(),
                });
            }
            if !self.is_valid_proof(block, block.hash()) {
                return Err(ChainError::InvalidProof {
                    index: block.index(),
                });
            }
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
