//! A minimal proof-of-work ledger.
//!
//! Blocks are hashed over a canonical JSON payload, mined by searching for a
//! nonce whose SHA-256 hex digest starts with `difficulty` zeros, and only
//! appended when they extend the current tip with a valid proof.
//!
//! ```
//! use pow_ledger::Chain;
//!
//! let mut chain = Chain::new(2).unwrap();
//! chain.submit_transaction("a->b:10");
//! assert_eq!(chain.mine(), Some(1));
//! assert!(chain.last_block().hash().starts_with("00"));
//! ```

pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod pow;
pub mod shared;

pub use block::{Block, SealedBlock};
pub use chain::Chain;
pub use config::ChainConfig;
pub use error::{ChainError, Result};
pub use shared::SharedChain;

/// Lowercase hexadecimal SHA-256 digest.
pub type HexDigest = String;

/// An opaque, application-defined transaction record.
pub type Transaction = serde_json::Value;
