use crate::error::Result;
use crate::{pow, Block, Chain, HexDigest, SealedBlock, Transaction};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Cloneable handle that serializes every mutation of one [`Chain`].
///
/// Mining holds the lock only to snapshot the tip and pool and, later, to
/// validate and append. The nonce search runs unlocked, so a candidate can
/// go stale while it is being mined; the tip re-check in
/// [`Chain::try_add_block`] rejects it in that case.
#[derive(Clone, Debug)]
pub struct SharedChain {
    inner: Arc<Mutex<Chain>>,
}

impl SharedChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            inner: Arc::new(Mutex::new(chain)),
        }
    }

    // Every mutation leaves the chain consistent, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Chain> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn submit_transaction(&self, transaction: impl Into<Transaction>) {
        self.lock().submit_transaction(transaction);
    }

    pub fn add_block(&self, block: Block, proof: HexDigest) -> bool {
        self.lock().add_block(block, proof)
    }

    pub fn last_block(&self) -> SealedBlock {
        self.lock().last_block().clone()
    }

    pub fn blocks(&self) -> Vec<SealedBlock> {
        self.lock().blocks().to_vec()
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.lock().pending_transactions().to_vec()
    }

    /// Runs `f` against the engine while holding the lock.
    pub fn with_chain<R>(&self, f: impl FnOnce(&Chain) -> R) -> R {
        f(&*self.lock())
    }

    pub fn mine(&self) -> Option<u64> {
        match self.try_mine() {
            Ok(index) => Some(index),
            Err(err) => {
                debug!(%err, "no block produced");
                None
            }
        }
    }

    pub fn try_mine(&self) -> Result<u64> {
        let (mut candidate, (difficulty, max_attempts)) = {
            let chain = self.lock();
            (chain.build_candidate()?, chain.search_params())
        };
        let proof = pow::search(&mut candidate, difficulty, max_attempts)?;
        self.lock().commit_mined(candidate, proof)
    }
}

impl From<Chain> for SharedChain {
    fn from(chain: Chain) -> Self {
        Self::new(chain)
    }
}
