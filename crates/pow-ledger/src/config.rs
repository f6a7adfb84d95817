use crate::constants::{DEFAULT_DIFFICULTY, HASH_HEX_SIZE};
use crate::error::ChainError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Engine settings, fixed for the lifetime of a [`crate::Chain`].
///
/// Deserializes from JSON; missing fields fall back to [`Default`]:
///
/// ```json
/// { "difficulty": 4, "max_attempts": 1000000 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Required number of leading `'0'` hex characters in a block hash.
    pub difficulty: usize,
    /// Cap on nonce attempts per mining run. `None` searches without bound.
    pub max_attempts: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_attempts: None,
        }
    }
}

impl ChainConfig {
    pub fn new(difficulty: usize) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        validate_difficulty(self.difficulty)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("parse chain config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read chain config {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("load chain config {}", path.display()))
    }
}

pub(crate) fn validate_difficulty(difficulty: usize) -> Result<(), ChainError> {
    if difficulty > HASH_HEX_SIZE {
        return Err(ChainError::InvalidDifficulty {
            difficulty,
            max: HASH_HEX_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_fields_missing() {
        let config = ChainConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ChainConfig::default());
        assert_eq!(config.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(config.max_attempts, None);
    }

    #[test]
    fn parses_all_fields() {
        let config =
            ChainConfig::from_json_str(r#"{"difficulty":4,"max_attempts":1000}"#).unwrap();
        assert_eq!(config, ChainConfig::new(4).with_max_attempts(1000));
    }

    #[test]
    fn rejects_difficulty_longer_than_digest() {
        let err = ChainConfig::from_json_str(r#"{"difficulty":65}"#).unwrap_err();
        let inner = err.downcast_ref::<ChainError>().expect("typed error");
        assert_eq!(
            *inner,
            ChainError::InvalidDifficulty {
                difficulty: 65,
                max: 64
            }
        );
        assert!(ChainConfig::new(64).validate().is_ok());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(ChainConfig::from_json_str("difficulty = 2").is_err());
    }
}
