use serde_json::{json, Value};
use std::time::Duration;

use super::{AiError, TextBackend};
use crate::config::PrimaryConfig;

/// Blocking client for a local Ollama service.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    timeout: Duration,
    probe_timeout: Duration,
}

impl OllamaClient {
    pub fn new(cfg: &PrimaryConfig) -> Self {
        OllamaClient {
            base_url: cfg.url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs.max(1)),
            probe_timeout: Duration::from_secs(cfg.probe_timeout_secs.max(1)),
        }
    }

    fn client(timeout: Duration) -> Result<reqwest::blocking::Client, AiError> {
        reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError(format!("HTTP client error: {}", e)))
    }

    /// List installed model names (`GET /api/tags`).
    pub fn list_models(&self) -> Result<Vec<String>, AiError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = Self::client(self.probe_timeout)?
            .get(&url)
            .send()
            .map_err(|e| AiError(format!("Ollama request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AiError(format!("Ollama returned {}", resp.status())));
        }

        let json: Value = resp
            .json()
            .map_err(|e| AiError(format!("Ollama JSON parse error: {}", e)))?;

        Ok(parse_model_names(&json))
    }

    /// Single-turn chat (`POST /api/chat`, non-streaming).
    pub fn chat(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });

        let resp = Self::client(self.timeout)?
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| AiError(format!("Ollama request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            return Err(AiError(format!("Ollama returned {}: {}", status, text)));
        }

        let json: Value = resp
            .json()
            .map_err(|e| AiError(format!("Ollama JSON parse error: {}", e)))?;

        parse_chat_content(&json)
    }
}

impl TextBackend for OllamaClient {
    fn label(&self) -> String {
        format!("Ollama ({})", self.model)
    }

    fn probe(&self) -> Result<(), AiError> {
        let models = self.list_models()?;
        if !models.iter().any(|m| m == &self.model) {
            log::warn!(
                "[ai] Ollama is up but model '{}' is not pulled (have: {})",
                self.model,
                models.join(", ")
            );
        }
        Ok(())
    }

    fn complete(&self, prompt: &str) -> Result<String, AiError> {
        self.chat(prompt)
    }
}

fn parse_model_names(json: &Value) -> Vec<String> {
    json.get("models")
        .and_then(|m| m.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_chat_content(json: &Value) -> Result<String, AiError> {
    if let Some(err) = json.get("error").and_then(|e| e.as_str()) {
        return Err(AiError(format!("Ollama error: {}", err)));
    }
    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(String::from)
        .ok_or_else(|| AiError("Ollama response has no message content".into()))
}
