//! Load-once, analyze-many lifecycle around the encoder, model, and classifier.
//!
//! ```text
//! Uninitialized ─▶ Loading ─▶ Ready ◀─▶ Analyzing
//!                     │
//!                     └─▶ Failed ─(initialize again)─▶ Loading
//! ```
//!
//! Requests are single-flight: the model sits behind an async mutex and each
//! forward pass holds it, so overlapping `analyze` calls queue up instead of
//! running concurrently.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use spamlens_core::{
    AnalysisResponse, Classification, ConfigError, EncodedInput, Encoder, InferenceError,
    PipelineConfig, ResourceLoadError, Score, Vocabulary, classify,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::adapter;
use crate::runtime::ModelRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Loading,
    Ready,
    Analyzing,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Analyzing => "analyzing",
            Self::Failed => "failed",
        }
    }
}

enum Phase<M> {
    Uninitialized,
    Loading,
    Ready(Loaded<M>),
    Failed,
}

struct Loaded<M> {
    encoder: Encoder,
    model: Arc<Mutex<M>>,
}

/// Spam classification pipeline over a [`ModelRuntime`].
pub struct SpamPipeline<M> {
    config: PipelineConfig,
    phase: Phase<M>,
    in_flight: AtomicUsize,
}

impl<M: ModelRuntime> SpamPipeline<M> {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            phase: Phase::Uninitialized,
            in_flight: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        match &self.phase {
            Phase::Uninitialized => PipelineState::Uninitialized,
            Phase::Loading => PipelineState::Loading,
            Phase::Failed => PipelineState::Failed,
            Phase::Ready(_) if self.in_flight.load(Ordering::SeqCst) > 0 => {
                PipelineState::Analyzing
            }
            Phase::Ready(_) => PipelineState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready(_))
    }

    /// The loaded vocabulary, once ready.
    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        match &self.phase {
            Phase::Ready(loaded) => Some(loaded.encoder.vocabulary()),
            _ => None,
        }
    }

    /// Run `load` to obtain the vocabulary and model, then become ready.
    ///
    /// Any failure leaves the pipeline `Failed`, as does dropping the returned
    /// future before it completes. Calling this again performs a full reload,
    /// discarding whatever was loaded before.
    pub async fn initialize<F, Fut>(&mut self, load: F) -> Result<(), ResourceLoadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(Vocabulary, M), ResourceLoadError>>,
    {
        let max_len = self.config.max_len;
        let loading = Loading::begin(&mut self.phase);
        info!("loading vocabulary and model");

        match load().await.and_then(|loaded| check_model(max_len, loaded)) {
            Ok((vocabulary, model)) => {
                info!(
                    entries = vocabulary.len(),
                    model = model.name(),
                    max_len,
                    "pipeline ready"
                );
                loading.finish(Phase::Ready(Loaded {
                    encoder: Encoder::new(Arc::new(vocabulary), max_len),
                    model: Arc::new(Mutex::new(model)),
                }));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "pipeline failed to load");
                loading.finish(Phase::Failed);
                Err(e)
            }
        }
    }

    /// Classify one message.
    ///
    /// `Ok(None)` means the text was blank after normalization: nothing is
    /// predicted and nothing is shown.
    pub async fn analyze(&self, text: &str) -> Result<Option<Classification>, InferenceError> {
        let Phase::Ready(loaded) = &self.phase else {
            return Err(InferenceError::NotReady);
        };
        let Some(encoded) = loaded.encoder.encode(text) else {
            return Ok(None);
        };

        let _analyzing = InFlight::enter(&self.in_flight);
        let score = self.predict(&loaded.model, encoded).await?;
        let classification = classify(score, self.config.threshold);
        info!(
            label = %classification.label,
            score = classification.raw_score,
            "analysis complete"
        );
        Ok(Some(classification))
    }

    /// [`analyze`](Self::analyze) mapped to the host-facing response.
    pub async fn analyze_response(
        &self,
        text: &str,
    ) -> Result<Option<AnalysisResponse>, InferenceError> {
        Ok(self.analyze(text).await?.map(|c| c.to_response()))
    }

    async fn predict(
        &self,
        model: &Arc<Mutex<M>>,
        encoded: EncodedInput,
    ) -> Result<Score, InferenceError> {
        let model = Arc::clone(model);
        let work = async move {
            let mut model = model.lock_owned().await;
            tokio::task::spawn_blocking(move || adapter::predict(&encoded, &mut *model)).await
        };

        let joined = match self.config.predict_timeout() {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| InferenceError::Timeout(limit))?,
            None => work.await,
        };

        joined.map_err(|e| InferenceError::Runtime(format!("prediction task failed: {e}")))?
    }
}

fn check_model<M: ModelRuntime>(
    max_len: usize,
    (vocabulary, model): (Vocabulary, M),
) -> Result<(Vocabulary, M), ResourceLoadError> {
    match model.input_len() {
        Some(len) if len != max_len => Err(ResourceLoadError::Model(format!(
            "{} expects sequences of {len}, configured max_len is {max_len}",
            model.name()
        ))),
        _ => Ok((vocabulary, model)),
    }
}

/// Holds the pipeline in `Loading`; falls back to `Failed` if dropped unfinished.
struct Loading<'a, M> {
    phase: &'a mut Phase<M>,
}

impl<'a, M> Loading<'a, M> {
    fn begin(phase: &'a mut Phase<M>) -> Self {
        *phase = Phase::Loading;
        Self { phase }
    }

    fn finish(self, outcome: Phase<M>) {
        *self.phase = outcome;
    }
}

impl<M> Drop for Loading<'_, M> {
    fn drop(&mut self) {
        if matches!(self.phase, Phase::Loading) {
            *self.phase = Phase::Failed;
        }
    }
}

/// Counts a request as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
