use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The vocabulary or model artifact could not be fetched or parsed.
///
/// Terminal for the pipeline: it stays `Failed` until a full reload.
#[derive(Debug, Error)]
pub enum ResourceLoadError {
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("vocabulary JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("vocabulary must be a JSON object of word to integer id")]
    NotAnObject,

    #[error("invalid vocabulary entry {key:?}: {reason}")]
    InvalidEntry { key: String, reason: String },

    #[error("model load failed: {0}")]
    Model(String),

    #[error("fetch failed: {0}")]
    Fetch(String),
}

/// A single analysis request failed. The pipeline remains usable.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model is not ready")]
    NotReady,

    #[error("input shape mismatch: model expects {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model returned an empty output")]
    EmptyOutput,

    #[error("model score {0} is outside [0, 1]")]
    ScoreOutOfRange(f32),

    #[error("prediction timed out after {0:?}")]
    Timeout(Duration),

    #[error("runtime error: {0}")]
    Runtime(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_len must be greater than zero")]
    InvalidMaxLen,

    #[error("threshold {0} is outside [0, 1]")]
    InvalidThreshold(f32),
}
