use crate::constants::GENESIS_PREVIOUS_HASH;
use crate::{HexDigest, Transaction};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::ops::Deref;

/// A candidate block. Everything except `nonce` is fixed at construction;
/// the nonce is only touched by the proof-of-work search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    transactions: Vec<Transaction>,
    timestamp: u64,
    previous_hash: HexDigest,
    nonce: u64,
}

/// The hashed payload. Fields are declared in sorted key order and
/// transactions go through [`Canonical`], so the compact JSON encoding of
/// this struct is canonical at every nesting level.
#[derive(Serialize)]
struct HashPayload<'a> {
    index: u64,
    nonce: u64,
    previous_hash: &'a str,
    timestamp: u64,
    #[serde(serialize_with = "serialize_canonical_seq")]
    transactions: &'a [Transaction],
}

/// Serializes a JSON value with object keys sorted at every level,
/// whatever map ordering `serde_json` was built with.
struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    out.serialize_entry(key, &Canonical(value))?;
                }
                out.end()
            }
            Value::Array(items) => serializer.collect_seq(items.iter().map(Canonical)),
            other => other.serialize(serializer),
        }
    }
}

fn serialize_canonical_seq<S: Serializer>(
    transactions: &&[Transaction],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(transactions.iter().map(Canonical))
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<Transaction>,
        timestamp: u64,
        previous_hash: impl Into<HexDigest>,
    ) -> Self {
        Self {
            index,
            transactions,
            timestamp,
            previous_hash: previous_hash.into(),
            nonce: 0,
        }
    }

    /// Genesis is seeded with its hash directly; it is never mined.
    pub fn genesis(timestamp: u64) -> SealedBlock {
        let block = Self::new(0, Vec::new(), timestamp, GENESIS_PREVIOUS_HASH);
        let hash = block.compute_hash();
        SealedBlock { block, hash }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub(crate) fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    fn payload(&self) -> HashPayload<'_> {
        HashPayload {
            index: self.index,
            nonce: self.nonce,
            previous_hash: &self.previous_hash,
            timestamp: self.timestamp,
            transactions: &self.transactions,
        }
    }

    /// Exact bytes fed to SHA-256: compact JSON of
    /// `{index, nonce, previous_hash, timestamp, transactions}` with sorted keys.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        // A payload made of integers, strings and JSON values always serializes.
        serde_json::to_vec(&self.payload()).expect("block payload serializes to JSON")
    }

    /// Lowercase hex SHA-256 of [`Block::canonical_bytes`].
    pub fn compute_hash(&self) -> HexDigest {
        let mut hasher = Sha256::new();
        serde_json::to_writer(&mut hasher, &self.payload())
            .expect("block payload serializes to JSON");
        hex::encode(hasher.finalize())
    }
}

/// A block accepted into the chain, carrying the hash it was accepted with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SealedBlock {
    #[serde(flatten)]
    block: Block,
    hash: HexDigest,
}

impl SealedBlock {
    pub(crate) fn new(block: Block, hash: HexDigest) -> Self {
        Self { block, hash }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn into_block(self) -> Block {
        self.block
    }
}

impl Deref for SealedBlock {
    type Target = Block;

    fn deref(&self) -> &Block {
        &self.block
    }
}
