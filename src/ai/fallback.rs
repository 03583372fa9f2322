use std::sync::{Arc, Mutex, RwLock};

use super::AiError;

/// Fixed generation parameters for the in-process pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineParams {
    /// Upper bound on prompt + generated tokens.
    pub max_length: usize,
    /// Cut over-long prompts down to `max_length` instead of failing.
    pub truncation: bool,
}

/// A loaded in-process text generation pipeline.
///
/// Returns a single sequence. The returned text may begin with the prompt
/// itself; callers strip that echo.
pub trait TextPipeline: Send + Sync {
    fn run(&self, prompt: &str, params: &PipelineParams) -> Result<String, AiError>;
}

/// Builds a [`TextPipeline`]. Loading may be slow and may fail.
pub trait PipelineLoader: Send + Sync {
    /// Name used in source labels, e.g. the model file stem.
    fn model_name(&self) -> String;

    /// Source label used in banners.
    fn label(&self) -> String {
        format!("Local ({})", self.model_name())
    }

    fn load(&self) -> Result<Arc<dyn TextPipeline>, AiError>;
}

/// Lazily constructed, memoized secondary pipeline.
///
/// Construction happens while `init` is held, so concurrent first callers
/// wait for one load instead of each loading the model. Readers only touch
/// `handle` and never wait on a load in progress.
pub struct SecondarySlot {
    loader: Box<dyn PipelineLoader>,
    init: Mutex<()>,
    handle: RwLock<Option<Arc<dyn TextPipeline>>>,
}

impl SecondarySlot {
    pub fn new(loader: Box<dyn PipelineLoader>) -> Self {
        SecondarySlot {
            loader,
            init: Mutex::new(()),
            handle: RwLock::new(None),
        }
    }

    pub fn model_name(&self) -> String {
        self.loader.model_name()
    }

    pub fn label(&self) -> String {
        self.loader.label()
    }

    /// Load the pipeline unless it is already present. A previous failure is
    /// retried on every call.
    pub fn ensure_ready(&self) -> Result<(), AiError> {
        if self.is_ready() {
            return Ok(());
        }
        let _init = self.init.lock().unwrap_or_else(|e| e.into_inner());
        if self.is_ready() {
            return Ok(());
        }
        log::info!(
            "[ai] Initializing local fallback pipeline with model: {}...",
            self.loader.model_name()
        );
        let pipeline = self.loader.load()?;
        *self.handle.write().unwrap_or_else(|e| e.into_inner()) = Some(pipeline);
        log::info!("[ai] Local fallback pipeline initialized successfully.");
        Ok(())
    }

    pub fn handle(&self) -> Option<Arc<dyn TextPipeline>> {
        self.handle.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_ready(&self) -> bool {
        self.handle
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

/// Remove a leading copy of `prompt` from pipeline output, once, and trim
/// the whitespace that follows it.
pub fn strip_echo(prompt: &str, output: &str) -> String {
    match output.strip_prefix(prompt) {
        Some(rest) => rest.trim_start().to_string(),
        None => output.to_string(),
    }
}
