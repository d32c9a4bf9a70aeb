//! Core of the spam classifier: word-index vocabulary, text encoder, and
//! score classification. No I/O.

pub mod config;
pub mod encode;
pub mod error;
pub mod verdict;
pub mod vocab;

pub use config::PipelineConfig;
pub use encode::{EncodedInput, Encoder, MAX_LEN, encode, is_blank, normalize, tokenize};
pub use error::{ConfigError, InferenceError, ResourceLoadError};
pub use verdict::{AnalysisResponse, Classification, DEFAULT_THRESHOLD, Label, Score, classify};
pub use vocab::{UNKNOWN_ID, VocabSummary, Vocabulary};
