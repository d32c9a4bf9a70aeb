//! The seam between the pipeline and whatever executes the trained model.

use spamlens_core::InferenceError;

/// Row-major `f32` matrix fed to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct InputMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl InputMatrix {
    /// A batch of one: `[1, row.len()]`.
    pub fn single_row(row: Vec<f32>) -> Self {
        Self {
            rows: 1,
            cols: row.len(),
            data: row,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Raw model output, flattened row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputMatrix {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl OutputMatrix {
    /// Value at row 0, column 0.
    pub fn first(&self) -> Option<f32> {
        self.data.first().copied()
    }
}

/// A loaded model that maps `[1, max_len]` ids to a `[1, 1]` spam probability.
pub trait ModelRuntime: Send + 'static {
    fn name(&self) -> &str;

    /// Fixed input width declared by the model, if any.
    fn input_len(&self) -> Option<usize>;

    /// Run one forward pass.
    fn predict(&mut self, input: &InputMatrix) -> Result<OutputMatrix, InferenceError>;
}

impl<M: ModelRuntime + ?Sized> ModelRuntime for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn input_len(&self) -> Option<usize> {
        (**self).input_len()
    }

    fn predict(&mut self, input: &InputMatrix) -> Result<OutputMatrix, InferenceError> {
        (**self).predict(input)
    }
}
