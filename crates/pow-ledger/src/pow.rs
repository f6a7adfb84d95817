use crate::error::{ChainError, Result};
use crate::{Block, HexDigest};
use rayon::prelude::*;
use tracing::{debug, info};

const PROGRESS_INTERVAL: u64 = 1 << 20;

pub fn count_leading_zero_digits(hash: &str) -> usize {
    hash.bytes().take_while(|b| *b == b'0').count()
}

/// True when `hash` starts with at least `difficulty` `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    count_leading_zero_digits(hash) >= difficulty
}

/// Resets the nonce to zero and increments it until the block hash meets
/// `difficulty`. There is no iteration cap: the cost of this loop is what
/// rate-limits block production. Only `nonce` is modified.
pub fn find_proof_of_work(candidate: &mut Block, difficulty: usize) -> HexDigest {
    candidate.set_nonce(0);
    let mut hash = candidate.compute_hash();
    while !meets_difficulty(&hash, difficulty) {
        let nonce = candidate.nonce().wrapping_add(1);
        if nonce % PROGRESS_INTERVAL == 0 {
            debug!(index = candidate.index(), nonce, "proof search in progress");
        }
        candidate.set_nonce(nonce);
        hash = candidate.compute_hash();
    }
    info!(
        index = candidate.index(),
        nonce = candidate.nonce(),
        %hash,
        "found proof of work"
    );
    hash
}

/// Same search as [`find_proof_of_work`], giving up after `max_attempts`
/// hashes. On exhaustion the candidate keeps the last nonce tried.
pub fn find_proof_of_work_bounded(
    candidate: &mut Block,
    difficulty: usize,
    max_attempts: u64,
) -> Result<HexDigest> {
    for nonce in 0..max_attempts {
        candidate.set_nonce(nonce);
        let hash = candidate.compute_hash();
        if meets_difficulty(&hash, difficulty) {
            info!(index = candidate.index(), nonce, %hash, "found proof of work");
            return Ok(hash);
        }
    }
    debug!(
        index = candidate.index(),
        attempts = max_attempts,
        "proof search exhausted"
    );
    Err(ChainError::ProofNotFound {
        attempts: max_attempts,
    })
}

/// Searches nonces in parallel. Returns the lowest satisfying nonce, so the
/// outcome is identical to [`find_proof_of_work`], only faster on many cores.
pub fn find_proof_of_work_parallel(candidate: &mut Block, difficulty: usize) -> Result<HexDigest> {
    let template = candidate.clone();
    let found = (0u64..u64::MAX)
        .into_par_iter()
        .map_init(
            || template.clone(),
            |block, nonce| {
                block.set_nonce(nonce);
                (nonce, block.compute_hash())
            },
        )
        .find_first(|(_, hash)| meets_difficulty(hash, difficulty));

    let (nonce, hash) = found.ok_or(ChainError::ProofNotFound {
        attempts: u64::MAX,
    })?;
    candidate.set_nonce(nonce);
    info!(index = candidate.index(), nonce, %hash, "found proof of work");
    Ok(hash)
}

/// Dispatches to the bounded or unbounded search depending on the cap.
pub(crate) fn search(
    candidate: &mut Block,
    difficulty: usize,
    max_attempts: Option<u64>,
) -> Result<HexDigest> {
    match max_attempts {
        Some(cap) => find_proof_of_work_bounded(candidate, difficulty, cap),
        None => Ok(find_proof_of_work(candidate, difficulty)),
    }
}
