use chrono::Local;
use std::fmt;

const BRAND: &str = "Wolfgank AI";
const END_MARKER: &str = "--- End of Report ---";

/// Why a generation call produced no text.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Primary unreachable at startup and no in-process model compiled in.
    NoSecondaryCapability,
    /// Building the in-process pipeline failed.
    SecondaryInitFailed { model: String },
    /// Initialization reported success but no pipeline is present.
    SecondaryMissing,
    /// The chosen backend raised during generation.
    Runtime { source: String, message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSecondaryCapability => write!(
                f,
                "Error: Ollama is unavailable and no secondary capability is compiled in \
                 (build with the `local-model` feature). Cannot generate text."
            ),
            Self::SecondaryInitFailed { model } => write!(
                f,
                "Error: Failed to initialize secondary fallback model ({}).",
                model
            ),
            Self::SecondaryMissing => write!(
                f,
                "Error: Secondary pipeline is not available after initialization attempt."
            ),
            Self::Runtime { source, message } => write!(
                f,
                "Error during text generation using {}: {}",
                source, message
            ),
        }
    }
}

/// Result of one `Gateway::generate` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Generated {
        tool: String,
        source: String,
        text: String,
        at: String,
    },
    Failed {
        reason: FailureReason,
        /// Leading-space sentence describing fallback state, may be empty.
        fallback_status: String,
        at: String,
    },
}

impl Outcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, Outcome::Generated { .. })
    }

    /// Banner text returned to the client.
    pub fn banner(&self) -> String {
        match self {
            Outcome::Generated {
                tool,
                source,
                text,
                at,
            } => format!(
                "--- {} [{}] Result ({} @ {}) ---\n\n{}\n\n{}",
                BRAND, tool, source, at, text, END_MARKER
            ),
            Outcome::Failed {
                reason,
                fallback_status,
                at,
            } => format!(
                "--- {} Error ({}) ---\n\n{}{}\nPlease check logs and model availability.\n\n{}",
                BRAND, at, reason, fallback_status, END_MARKER
            ),
        }
    }
}

pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
