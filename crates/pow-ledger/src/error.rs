use crate::HexDigest;
use thiserror::Error;

/// Every failure the engine reports. None of them is fatal: a rejected
/// block or an empty pool leaves the chain exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("no pending transactions to mine")]
    EmptyPool,

    #[error("block {index} does not extend the tip: expected previous hash {expected}, got {found}")]
    StaleBlock {
        index: u64,
        expected: HexDigest,
        found: HexDigest,
    },

    #[error("expected block index {expected}, got {found}")]
    UnexpectedIndex { expected: u64, found: u64 },

    #[error("invalid proof of work for block {index}")]
    InvalidProof { index: u64 },

    #[error("block {index} is not linked to its predecessor")]
    BrokenLink { index: u64 },

    #[error("no proof of work found after {attempts} attempts")]
    ProofNotFound { attempts: u64 },

    #[error("difficulty {difficulty} exceeds the {max} hex characters of a digest")]
    InvalidDifficulty { difficulty: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, ChainError>;
