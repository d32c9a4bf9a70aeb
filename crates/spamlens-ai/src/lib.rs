//! Inference layer: model runtime seam, ONNX Runtime backend, artifact
//! loading, and the pipeline lifecycle.

pub mod adapter;
pub mod loader;
pub mod pipeline;
pub mod runtime;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;

#[cfg(test)]
mod fake;

pub use adapter::predict;
pub use loader::{ArtifactSource, Artifacts, MODEL_FILE, VOCAB_FILE, load_vocabulary};
#[cfg(feature = "onnx")]
pub use loader::{load_onnx, load_onnx_model};
pub use pipeline::{PipelineState, SpamPipeline};
pub use runtime::{InputMatrix, ModelRuntime, OutputMatrix};
