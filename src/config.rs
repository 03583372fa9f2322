use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file read from the working directory at startup.
pub const CONFIG_FILE: &str = "wolfgank.toml";

// ── Sections ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub primary: PrimaryConfig,
    pub secondary: SecondaryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub template_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: "0.0.0.0".to_string(),
            port: 5000,
            template_dir: "templates".to_string(),
        }
    }
}

/// Ollama service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrimaryConfig {
    pub url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub probe_timeout_secs: u64,
    /// 0 = probe once at startup only.
    pub reprobe_interval_secs: u64,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        PrimaryConfig {
            url: "http://localhost:11434".to_string(),
            model: "gemma3:1b".to_string(),
            timeout_secs: 120,
            probe_timeout_secs: 5,
            reprobe_interval_secs: 0,
        }
    }
}

/// In-process fallback model settings. Only used with the `local-model` feature.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecondaryConfig {
    pub model_path: String,
    pub tokenizer_path: String,
    pub device: String,
    pub max_length: usize,
    pub temperature: f64,
    pub seed: u64,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        SecondaryConfig {
            model_path: "models/tinyllama-1.1b-chat.Q4_K_M.gguf".to_string(),
            tokenizer_path: String::new(),
            device: "auto".to_string(),
            max_length: 700,
            temperature: 0.8,
            seed: 299792458,
        }
    }
}

impl SecondaryConfig {
    /// Display name for banners and logs: the model file stem.
    pub fn model_name(&self) -> String {
        Path::new(&self.model_path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.model_path.clone())
    }

    /// Explicit tokenizer path, or `tokenizer.json` beside the model.
    pub fn resolved_tokenizer_path(&self) -> PathBuf {
        if !self.tokenizer_path.trim().is_empty() {
            return PathBuf::from(&self.tokenizer_path);
        }
        Path::new(&self.model_path)
            .parent()
            .map(|p| p.join("tokenizer.json"))
            .unwrap_or_else(|| PathBuf::from("tokenizer.json"))
    }
}

// ── Loading ───────────────────────────────────────────

impl Config {
    /// Read `wolfgank.toml`. A missing file yields defaults; a malformed one
    /// is reported and also yields defaults.
    pub fn load() -> Config {
        match std::fs::read_to_string(CONFIG_FILE) {
            Ok(raw) => Self::parse(&raw).unwrap_or_else(|e| {
                log::error!("[config] {} is invalid, using defaults: {}", CONFIG_FILE, e);
                Config::default()
            }),
            Err(_) => {
                log::info!("[config] {} not found, using defaults", CONFIG_FILE);
                Config::default()
            }
        }
    }

    pub fn parse(raw: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(raw)
    }
}
