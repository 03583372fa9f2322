pub mod fallback;
#[cfg(feature = "local-model")]
pub mod local;
pub mod ollama;
pub mod prompts;
pub mod report;

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::config::{Config, SecondaryConfig};
use fallback::{strip_echo, PipelineParams, SecondarySlot};
use ollama::OllamaClient;
use report::{timestamp, FailureReason, Outcome};

// ── Types ─────────────────────────────────────────────

#[derive(Debug)]
pub struct AiError(pub String);

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for AiError {}

/// A remote text generation service.
pub trait TextBackend: Send + Sync {
    /// Source label used in banners, e.g. `Ollama (gemma3:1b)`.
    fn label(&self) -> String;
    /// Cheap liveness check.
    fn probe(&self) -> Result<(), AiError>;
    fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

const METHOD_NONE: &str = "None";
const METHOD_SUPPORT_MISSING: &str = "Error: Local Model Support Missing";
const METHOD_INIT_FAILED: &str = "Error: Local Model Init Failed";

/// Which backend a call will use, resolved from current state.
pub enum BackendState<'a> {
    Primary(&'a dyn TextBackend),
    Secondary(&'a SecondarySlot),
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    pub method: String,
    pub primary_available: bool,
    pub secondary_capability: bool,
    pub secondary_ready: bool,
}

// ── Gateway ───────────────────────────────────────────

/// Picks the primary or secondary backend and turns every call into an
/// [`Outcome`]. Exactly one backend is tried per call.
pub struct Gateway {
    primary: Box<dyn TextBackend>,
    /// `None` when the in-process model is not compiled in.
    secondary: Option<SecondarySlot>,
    params: PipelineParams,
    primary_available: AtomicBool,
    method: RwLock<String>,
}

impl Gateway {
    pub fn new(
        primary: Box<dyn TextBackend>,
        secondary: Option<SecondarySlot>,
        params: PipelineParams,
    ) -> Self {
        Gateway {
            primary,
            secondary,
            params,
            primary_available: AtomicBool::new(false),
            method: RwLock::new(METHOD_NONE.to_string()),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Gateway::new(
            Box::new(OllamaClient::new(&cfg.primary)),
            secondary_slot(&cfg.secondary),
            PipelineParams {
                max_length: cfg.secondary.max_length,
                truncation: true,
            },
        )
    }

    pub fn method(&self) -> String {
        self.method
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_method(&self, method: impl Into<String>) {
        *self.method.write().unwrap_or_else(|e| e.into_inner()) = method.into();
    }

    pub fn primary_available(&self) -> bool {
        self.primary_available.load(Ordering::Acquire)
    }

    pub fn has_secondary_capability(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn status(&self) -> GatewayStatus {
        GatewayStatus {
            method: self.method(),
            primary_available: self.primary_available(),
            secondary_capability: self.has_secondary_capability(),
            secondary_ready: self.secondary.as_ref().map_or(false, |s| s.is_ready()),
        }
    }

    // ── Startup ───────────────────────────────────────

    /// Liveness-check the primary service and record the result.
    pub fn probe(&self) -> bool {
        let label = self.primary.label();
        log::info!("[ai] Checking Ollama availability ({})...", label);
        match self.primary.probe() {
            Ok(()) => {
                self.primary_available.store(true, Ordering::Release);
                log::info!(
                    "[ai] Ollama service detected. Using primary generation method: {}",
                    label
                );
                self.set_method(label);
                true
            }
            Err(e) => {
                self.primary_available.store(false, Ordering::Release);
                log::warn!(
                    "[ai] Could not connect to Ollama. Will attempt local fallback. Error: {}",
                    e
                );
                false
            }
        }
    }

    /// Probe, and load the fallback pipeline right away if the primary is down.
    pub fn bring_up(&self) {
        if !self.probe() {
            self.ensure_secondary_ready();
        }
    }

    /// Make sure the in-process pipeline is loaded. Cheap once it is.
    pub fn ensure_secondary_ready(&self) -> bool {
        let Some(slot) = &self.secondary else {
            log::error!(
                "[ai] Local model support is not compiled in. Cannot initialize fallback pipeline."
            );
            self.set_method(METHOD_SUPPORT_MISSING);
            return false;
        };
        match slot.ensure_ready() {
            Ok(()) => {
                self.set_method(slot.label());
                true
            }
            Err(e) => {
                log::error!(
                    "[ai] Failed to initialize local fallback pipeline ({}): {}",
                    slot.model_name(),
                    e
                );
                self.set_method(METHOD_INIT_FAILED);
                false
            }
        }
    }

    // ── Generation ────────────────────────────────────

    pub fn backend_state(&self) -> BackendState<'_> {
        if self.primary_available() {
            BackendState::Primary(self.primary.as_ref())
        } else if let Some(slot) = &self.secondary {
            BackendState::Secondary(slot)
        } else {
            BackendState::Unavailable
        }
    }

    pub fn generate(&self, prompt: &str, tool: &str) -> Outcome {
        let result = match self.backend_state() {
            BackendState::Primary(backend) => self.run_primary(backend, prompt, tool),
            BackendState::Secondary(slot) => self.run_secondary(slot, prompt, tool),
            BackendState::Unavailable => {
                let reason = FailureReason::NoSecondaryCapability;
                log::error!("[ai] {}", reason);
                Err(reason)
            }
        };

        let at = timestamp();
        match result {
            Ok((source, text)) => Outcome::Generated {
                tool: tool.to_string(),
                source,
                text,
                at,
            },
            Err(reason) => Outcome::Failed {
                reason,
                fallback_status: self.fallback_status(),
                at,
            },
        }
    }

    fn run_primary(
        &self,
        backend: &dyn TextBackend,
        prompt: &str,
        tool: &str,
    ) -> Result<(String, String), FailureReason> {
        let source = backend.label();
        log::info!("[ai] Attempting generation via {} for {}...", source, tool);
        match backend.complete(prompt) {
            Ok(text) => {
                log::info!("[ai] Received response from {} for {}.", source, tool);
                Ok((source, text))
            }
            Err(e) => {
                log::error!(
                    "[ai] Error during text generation via {} for {}: {}",
                    source,
                    tool,
                    e
                );
                Err(FailureReason::Runtime {
                    source,
                    message: e.0,
                })
            }
        }
    }

    fn run_secondary(
        &self,
        slot: &SecondarySlot,
        prompt: &str,
        tool: &str,
    ) -> Result<(String, String), FailureReason> {
        let source = slot.label();
        log::info!(
            "[ai] Ollama unavailable. Attempting generation via {} for {}...",
            source,
            tool
        );

        if !slot.is_ready() && !self.ensure_secondary_ready() {
            return Err(FailureReason::SecondaryInitFailed {
                model: slot.model_name(),
            });
        }

        let Some(pipeline) = slot.handle() else {
            let reason = FailureReason::SecondaryMissing;
            log::error!("[ai] {}", reason);
            return Err(reason);
        };

        match pipeline.run(prompt, &self.params) {
            Ok(raw) => {
                log::info!("[ai] Received response from {} for {}.", source, tool);
                Ok((source, strip_echo(prompt, &raw)))
            }
            Err(e) => {
                log::error!(
                    "[ai] Error during text generation via {} for {}: {}",
                    source,
                    tool,
                    e
                );
                Err(FailureReason::Runtime {
                    source,
                    message: e.0,
                })
            }
        }
    }

    /// Extra sentence for error banners explaining why no fallback ran.
    fn fallback_status(&self) -> String {
        let method = self.method();
        if method.starts_with("Error") {
            return format!(" Fallback Status: {}.", method);
        }
        if self.primary_available() {
            return String::new();
        }
        match &self.secondary {
            None => " Fallback attempted but local model support is not compiled in.".to_string(),
            Some(slot) if !slot.is_ready() => format!(
                " Fallback attempted but local model ({}) failed to initialize.",
                slot.model_name()
            ),
            Some(_) => String::new(),
        }
    }
}

#[cfg(feature = "local-model")]
fn secondary_slot(cfg: &SecondaryConfig) -> Option<SecondarySlot> {
    Some(SecondarySlot::new(Box::new(local::CandleLoader::new(
        cfg.clone(),
    ))))
}

#[cfg(not(feature = "local-model"))]
fn secondary_slot(_cfg: &SecondaryConfig) -> Option<SecondarySlot> {
    None
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /// Scripted primary backend. `up` can be flipped while the gateway holds it.
    pub struct StubPrimary {
        pub up: Arc<AtomicBool>,
        pub reply: Result<String, String>,
        pub calls: Arc<AtomicUsize>,
    }

    impl StubPrimary {
        pub fn replying(text: &str) -> Self {
            StubPrimary {
                up: Arc::new(AtomicBool::new(true)),
                reply: Ok(text.to_string()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn down() -> Self {
            StubPrimary {
                up: Arc::new(AtomicBool::new(false)),
                reply: Err("connection refused".to_string()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl TextBackend for StubPrimary {
        fn label(&self) -> String {
            "Ollama (stub:1b)".to_string()
        }

        fn probe(&self) -> Result<(), AiError> {
            if self.up.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(AiError("connection refused".into()))
            }
        }

        fn complete(&self, _prompt: &str) -> Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(AiError)
        }
    }

    pub fn params() -> PipelineParams {
        PipelineParams {
            max_length: 700,
            truncation: true,
        }
    }
}
