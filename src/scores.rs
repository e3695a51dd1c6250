//! Openness score table.
//!
//! Loaded once at startup from a JSON configuration resource: a list of
//! `[format_shortname, integer_score]` pairs, with `_comment` entries
//! skipped. The table either loads fully or not at all; it is an explicit
//! object handed by reference into every scoring call, never an ambient
//! global.

use crate::error::{QaError, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Built-in default configuration, shipped with the crate.
const DEFAULT_SCORES: &str = include_str!("resource_format_scores.json");

/// Immutable map from format shortname to openness score (0-5).
#[derive(Debug, Clone)]
pub struct ScoreTable {
    scores: HashMap<String, u8>,
}

impl ScoreTable {
    /// Load the built-in default table.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(DEFAULT_SCORES)
    }

    /// Load a table from a JSON file on disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Parse a table from raw JSON.
    ///
    /// Malformed JSON, a non-integer or out-of-range score, and a duplicate
    /// shortname are all fatal; the offending entry is named in the error.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let entries: Vec<Vec<serde_json::Value>> = serde_json::from_str(raw)
            .map_err(|e| QaError::ScoreConfig(format!("invalid JSON syntax: {}", e)))?;

        let mut scores = HashMap::new();
        for entry in &entries {
            let name = entry
                .first()
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    QaError::ScoreConfig(format!("entry must start with a shortname: {:?}", entry))
                })?;
            if name == "_comment" {
                continue;
            }
            if entry.len() != 2 {
                return Err(QaError::ScoreConfig(format!(
                    "entry for {:?} must be a [shortname, score] pair",
                    name
                )));
            }
            let score = entry[1].as_i64().ok_or_else(|| {
                QaError::ScoreConfig(format!(
                    "score must be an integer for {:?}: {}",
                    name, entry[1]
                ))
            })?;
            if !(0..=5).contains(&score) {
                return Err(QaError::ScoreConfig(format!(
                    "score must be in 0..=5 for {:?}: {}",
                    name, score
                )));
            }
            if scores.insert(name.to_string(), score as u8).is_some() {
                return Err(QaError::ScoreConfig(format!(
                    "duplicate resource format identifier: {:?}",
                    name
                )));
            }
        }
        debug!("score table loaded with {} formats", scores.len());
        Ok(Self { scores })
    }

    /// Openness score for a format shortname, if configured.
    pub fn score_for(&self, shortname: &str) -> Option<u8> {
        self.scores.get(shortname).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
