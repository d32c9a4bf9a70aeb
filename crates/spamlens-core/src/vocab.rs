//! Word-index vocabulary exported alongside the trained model.
//!
//! The artifact is a flat JSON object mapping lowercase words to positive
//! integer ids (`{"the": 1, "to": 2, ...}`). Id `0` is reserved for padding
//! and out-of-vocabulary words, so a well-formed vocabulary never uses it.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ResourceLoadError;

/// Id assigned to padding and to words absent from the vocabulary.
pub const UNKNOWN_ID: u32 = 0;

/// Immutable word → id mapping, loaded once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    index: HashMap<String, u32>,
}

/// Summary statistics for a [`Vocabulary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabSummary {
    pub entries: usize,
    pub max_id: u32,
    /// Entries mapped to the reserved id; these behave like unknown words.
    pub reserved_ids: usize,
}

impl Vocabulary {
    pub fn from_map(index: HashMap<String, u32>) -> Self {
        Self { index }
    }

    /// Parse the JSON word-index artifact.
    ///
    /// Rejects anything other than a flat object of non-negative integers
    /// that fit in `u32`.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ResourceLoadError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let Value::Object(map) = value else {
            return Err(ResourceLoadError::NotAnObject);
        };

        let mut index = HashMap::with_capacity(map.len());
        for (key, value) in map {
            let id = match value.as_u64() {
                Some(n) => u32::try_from(n).map_err(|_| ResourceLoadError::InvalidEntry {
                    key: key.clone(),
                    reason: format!("id {n} does not fit in u32"),
                })?,
                None => {
                    return Err(ResourceLoadError::InvalidEntry {
                        key,
                        reason: format!("expected a non-negative integer, found {value}"),
                    });
                }
            };
            index.insert(key, id);
        }

        let vocab = Self { index };
        let summary = vocab.summary();
        if summary.reserved_ids > 0 {
            warn!(
                count = summary.reserved_ids,
                "vocabulary entries use reserved id 0 and will encode as unknown"
            );
        }
        debug!(entries = summary.entries, max_id = summary.max_id, "parsed vocabulary");
        Ok(vocab)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ResourceLoadError> {
        Self::from_json_slice(json.as_bytes())
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, word: &str) -> Option<u32> {
        self.index.get(word).copied()
    }

    /// Lookup that falls back to [`UNKNOWN_ID`].
    pub fn id_of(&self, word: &str) -> u32 {
        self.get(word).unwrap_or(UNKNOWN_ID)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn summary(&self) -> VocabSummary {
        VocabSummary {
            entries: self.index.len(),
            max_id: self.index.values().copied().max().unwrap_or(UNKNOWN_ID),
            reserved_ids: self.index.values().filter(|&&id| id == UNKNOWN_ID).count(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        Self {
            index: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
