//! Encoded input → model → score.

use spamlens_core::{EncodedInput, InferenceError, Score};

use crate::runtime::{InputMatrix, ModelRuntime};

/// Run the model on one encoded message and extract its spam probability.
///
/// The input goes in as a `[1, max_len]` float matrix; the score is the
/// first element of the output. No retry on failure.
pub fn predict<M: ModelRuntime + ?Sized>(
    encoded: &EncodedInput,
    model: &mut M,
) -> Result<Score, InferenceError> {
    if let Some(expected) = model.input_len()
        && expected != encoded.len()
    {
        return Err(InferenceError::ShapeMismatch {
            expected,
            actual: encoded.len(),
        });
    }

    let input = InputMatrix::single_row(encoded.to_f32_row());
    let output = model.predict(&input)?;
    let value = output.first().ok_or(InferenceError::EmptyOutput)?;
    Score::new(value)
}
