//! In-memory [`ModelRuntime`] for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spamlens_core::InferenceError;

use crate::runtime::{InputMatrix, ModelRuntime, OutputMatrix};

/// Call records shared with the test after the model has been moved away.
#[derive(Default)]
pub(crate) struct CallLog {
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    inputs: Mutex<Vec<InputMatrix>>,
}

impl CallLog {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping `predict` calls seen.
    pub(crate) fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub(crate) fn inputs(&self) -> Vec<InputMatrix> {
        self.inputs.lock().unwrap().clone()
    }
}

pub(crate) struct FakeModel {
    output: Result<Vec<f32>, String>,
    input_len: Option<usize>,
    delay: Option<Duration>,
    log: Arc<CallLog>,
}

impl FakeModel {
    pub(crate) fn scoring(score: f32) -> Self {
        Self::with_output(vec![score])
    }

    pub(crate) fn with_output(data: Vec<f32>) -> Self {
        Self {
            output: Ok(data),
            input_len: None,
            delay: None,
            log: Arc::default(),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            output: Err(message.to_string()),
            ..Self::with_output(vec![])
        }
    }

    pub(crate) fn with_input_len(mut self, len: usize) -> Self {
        self.input_len = Some(len);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn call_log(&self) -> Arc<CallLog> {
        Arc::clone(&self.log)
    }

    pub(crate) fn calls(&self) -> usize {
        self.log.calls()
    }

    pub(crate) fn inputs(&self) -> Vec<InputMatrix> {
        self.log.inputs()
    }
}

impl ModelRuntime for FakeModel {
    fn name(&self) -> &str {
        "fake"
    }

    fn input_len(&self) -> Option<usize> {
        self.input_len
    }

    fn predict(&mut self, input: &InputMatrix) -> Result<OutputMatrix, InferenceError> {
        let log = &self.log;
        log.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = log.active.fetch_add(1, Ordering::SeqCst) + 1;
        log.max_active.fetch_max(now_active, Ordering::SeqCst);
        log.inputs.lock().unwrap().push(input.clone());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        log.active.fetch_sub(1, Ordering::SeqCst);

        match &self.output {
            Ok(data) => Ok(OutputMatrix {
                shape: vec![1, data.len()],
                data: data.clone(),
            }),
            Err(message) => Err(InferenceError::Runtime(message.clone())),
        }
    }
}
