//! Score → label and confidence percentage.

use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Scores strictly above this are spam.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Spam probability in `[0, 1]`, as produced by the model.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Score(f32);

impl Score {
    pub fn new(value: f32) -> Result<Self, InferenceError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InferenceError::ScoreOutOfRange(value))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Spam,
    Ham,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spam => "SPAM",
            Self::Ham => "HAM",
        }
    }

    /// Sentence shown to the user for this label.
    pub fn headline(&self) -> &'static str {
        match self {
            Self::Spam => "This message is likely SPAM.",
            Self::Ham => "This message seems SAFE (Ham).",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one analysis request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: Label,
    /// `score * 100`, rounded to two decimals.
    pub percentage: f64,
    pub raw_score: f32,
}

impl Classification {
    /// Percentage with exactly two decimals, e.g. `"100.00"`.
    pub fn formatted_percentage(&self) -> String {
        format!("{:.2}", self.percentage)
    }

    pub fn to_response(&self) -> AnalysisResponse {
        AnalysisResponse {
            label: self.label,
            percentage: self.formatted_percentage(),
            raw_score: self.raw_score,
        }
    }
}

/// What a host receives for a completed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub label: Label,
    pub percentage: String,
    pub raw_score: f32,
}

/// Map a score to a label. The comparison is strict: a score equal to the
/// threshold is ham.
pub fn classify(score: Score, threshold: f32) -> Classification {
    let raw_score = score.value();
    let label = if raw_score > threshold {
        Label::Spam
    } else {
        Label::Ham
    };

    Classification {
        label,
        percentage: round2(f64::from(raw_score) * 100.0),
        raw_score,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
