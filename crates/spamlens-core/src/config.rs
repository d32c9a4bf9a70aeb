//! Pipeline settings shared by the encoder, adapter, and classifier.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::encode::MAX_LEN;
use crate::error::ConfigError;
use crate::verdict::DEFAULT_THRESHOLD;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sequence length the model was trained with.
    pub max_len: usize,
    pub threshold: f32,
    /// Per-request prediction timeout. `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_len: MAX_LEN,
            threshold: DEFAULT_THRESHOLD,
            timeout_ms: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_len == 0 {
            return Err(ConfigError::InvalidMaxLen);
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    pub fn predict_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
