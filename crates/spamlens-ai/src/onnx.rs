//! ONNX Runtime backend for the exported spam model.
//!
//! The model directory must contain `model.onnx` (the Keras classifier
//! converted to ONNX: one `[batch, max_len]` float input, one `[batch, 1]`
//! sigmoid output).

use std::path::Path;

use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use spamlens_core::InferenceError;
use tracing::info;

use crate::loader::MODEL_FILE;
use crate::runtime::{InputMatrix, ModelRuntime, OutputMatrix};

/// Spam classifier executed by ONNX Runtime.
pub struct OnnxModel {
    session: Session,
    name: String,
    input_len: Option<usize>,
}

impl OnnxModel {
    /// Load `model.onnx` from a model directory.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        anyhow::ensure!(model_path.exists(), "{MODEL_FILE} not found in {model_dir:?}");
        Self::from_file(&model_path)
    }

    pub fn from_file(model_path: &Path) -> anyhow::Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;
        Ok(Self::from_session(session, model_path.display().to_string()))
    }

    /// Build from model bytes already in memory (e.g. fetched over HTTP).
    pub fn from_bytes(bytes: &[u8], name: &str) -> anyhow::Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_memory(bytes)?;
        Ok(Self::from_session(session, name.to_string()))
    }

    fn from_session(session: Session, name: String) -> Self {
        let input_len = session
            .inputs()
            .first()
            .and_then(|input| infer_input_len(input.dtype()));
        info!(model = %name, ?input_len, "loaded spam model");
        Self {
            session,
            name,
            input_len,
        }
    }
}

impl ModelRuntime for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_len(&self) -> Option<usize> {
        self.input_len
    }

    fn predict(&mut self, input: &InputMatrix) -> Result<OutputMatrix, InferenceError> {
        let shape = [input.rows() as i64, input.cols() as i64];
        let tensor = Tensor::from_array((shape, input.data().to_vec().into_boxed_slice()))
            .map_err(runtime_error)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(runtime_error)?;

        let (output_shape, output_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(runtime_error)?;
        let dims: &[i64] = output_shape;

        Ok(OutputMatrix {
            shape: dims.iter().map(|&d| d.max(0) as usize).collect(),
            data: output_data.to_vec(),
        })
    }
}

fn runtime_error(e: ort::Error) -> InferenceError {
    InferenceError::Runtime(e.to_string())
}

/// Fixed sequence length from the first input's static shape.
fn infer_input_len(input_type: &ort::value::ValueType) -> Option<usize> {
    match input_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
