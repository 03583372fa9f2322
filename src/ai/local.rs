//! In-process fallback model: a quantized GGUF llama-family model run with
//! Candle. Compiled only with the `local-model` feature.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use candle_core::quantized::gguf_file;
use candle_core::{Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::quantized_llama::ModelWeights;
use tokenizers::Tokenizer;

use super::fallback::{PipelineLoader, PipelineParams, TextPipeline};
use super::AiError;
use crate::config::SecondaryConfig;

const REPEAT_PENALTY: f32 = 1.1;
const REPEAT_LAST_N: usize = 64;
const TOP_P: f64 = 0.9;

// ── Loader ────────────────────────────────────────────

pub struct CandleLoader {
    config: SecondaryConfig,
}

impl CandleLoader {
    pub fn new(config: SecondaryConfig) -> Self {
        CandleLoader { config }
    }

    /// `auto` tries CUDA, then Metal, then falls back to the CPU.
    fn select_device(&self) -> Device {
        let pref = self.config.device.to_lowercase();
        if pref == "cpu" {
            return Device::Cpu;
        }
        if pref == "cuda" || pref == "auto" {
            match Device::new_cuda(0) {
                Ok(device) => {
                    log::info!("[ai] Candle: using CUDA device 0");
                    return device;
                }
                Err(e) if pref == "cuda" => log::warn!("[ai] Candle: CUDA unavailable: {}", e),
                Err(_) => {}
            }
        }
        if pref == "metal" || pref == "auto" {
            match Device::new_metal(0) {
                Ok(device) => {
                    log::info!("[ai] Candle: using Metal device 0");
                    return device;
                }
                Err(e) if pref == "metal" => log::warn!("[ai] Candle: Metal unavailable: {}", e),
                Err(_) => {}
            }
        }
        log::info!("[ai] Candle: using CPU");
        Device::Cpu
    }
}

impl PipelineLoader for CandleLoader {
    fn model_name(&self) -> String {
        self.config.model_name()
    }

    fn label(&self) -> String {
        format!("Candle ({})", self.model_name())
    }

    fn load(&self) -> Result<Arc<dyn TextPipeline>, AiError> {
        let model_path = Path::new(&self.config.model_path);
        if !model_path.exists() {
            return Err(AiError(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }
        let tokenizer_path = self.config.resolved_tokenizer_path();
        let device = self.select_device();

        let mut file = std::fs::File::open(model_path)
            .map_err(|e| AiError(format!("failed to open GGUF file: {}", e)))?;
        let content = gguf_file::Content::read(&mut file)
            .map_err(|e| AiError(format!("failed to parse GGUF file: {}", e)))?;
        let model = ModelWeights::from_gguf(content, &mut file, &device)
            .map_err(|e| AiError(format!("failed to load model weights: {}", e)))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            AiError(format!(
                "failed to load tokenizer from '{}': {}",
                tokenizer_path.display(),
                e
            ))
        })?;
        let eos_token = find_eos_token(&tokenizer);

        log::info!(
            "[ai] Candle: loaded '{}' (EOS token: {:?})",
            self.model_name(),
            eos_token
        );

        Ok(Arc::new(CandlePipeline {
            state: Mutex::new(ModelState { model, device }),
            tokenizer,
            eos_token,
            temperature: self.config.temperature,
            seed: self.config.seed,
            calls: AtomicU64::new(0),
        }))
    }
}

fn find_eos_token(tokenizer: &Tokenizer) -> Option<u32> {
    ["</s>", "<eos>", "<|end|>", "<|eot_id|>", "<|endoftext|>"]
        .iter()
        .find_map(|t| tokenizer.token_to_id(t))
}

// ── Pipeline ──────────────────────────────────────────

struct ModelState {
    model: ModelWeights,
    device: Device,
}

/// Forward passes mutate the KV cache, so generations are serialized.
struct CandlePipeline {
    state: Mutex<ModelState>,
    tokenizer: Tokenizer,
    eos_token: Option<u32>,
    temperature: f64,
    /// Base seed; each call samples with its own seed derived from it.
    seed: u64,
    calls: AtomicU64,
}

/// Sampling seed for the `call`-th generation. Reproducible for a given base
/// seed and call order, different from one call to the next.
fn call_seed(base: u64, call: u64) -> u64 {
    base.wrapping_add(call.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn candle_err(stage: &str) -> impl Fn(candle_core::Error) -> AiError + '_ {
    move |e| AiError(format!("{} failed: {}", stage, e))
}

impl TextPipeline for CandlePipeline {
    /// Decodes prompt and continuation together, like a text-generation
    /// pipeline that echoes its input.
    fn run(&self, prompt: &str, params: &PipelineParams) -> Result<String, AiError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| AiError(format!("tokenization failed: {}", e)))?;
        let mut tokens = encoding.get_ids().to_vec();

        if tokens.len() >= params.max_length {
            if !params.truncation {
                return Err(AiError(format!(
                    "prompt is {} tokens, max_length is {}",
                    tokens.len(),
                    params.max_length
                )));
            }
            // leave room for at least one generated token
            tokens.truncate(params.max_length.saturating_sub(1).max(1));
        }
        let prompt_len = tokens.len();
        if prompt_len == 0 {
            return Err(AiError("prompt produced no tokens".into()));
        }

        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let ModelState { model, device } = &mut *guard;
        let seed = call_seed(self.seed, self.calls.fetch_add(1, Ordering::Relaxed));
        let mut sampler = LogitsProcessor::new(seed, Some(self.temperature), Some(TOP_P));

        let mut next_input = tokens.clone();
        let mut index_pos = 0;
        while tokens.len() < params.max_length {
            let input = Tensor::new(next_input.as_slice(), device)
                .and_then(|t| t.unsqueeze(0))
                .map_err(candle_err("tensor creation"))?;
            let logits = model
                .forward(&input, index_pos)
                .and_then(|l| l.squeeze(0))
                .map_err(candle_err("forward pass"))?;
            index_pos += next_input.len();

            let start = tokens.len().saturating_sub(REPEAT_LAST_N);
            let logits = candle_transformers::utils::apply_repeat_penalty(
                &logits,
                REPEAT_PENALTY,
                &tokens[start..],
            )
            .map_err(candle_err("repeat penalty"))?;

            let next = sampler.sample(&logits).map_err(candle_err("sampling"))?;
            if Some(next) == self.eos_token {
                break;
            }
            tokens.push(next);
            next_input = vec![next];
        }

        log::debug!(
            "[ai] Candle: generated {} tokens",
            tokens.len() - prompt_len
        );

        let generated = self
            .tokenizer
            .decode(&tokens[prompt_len..], true)
            .map_err(|e| AiError(format!("decoding failed: {}", e)))?;
        Ok(format!("{}{}", prompt, generated))
    }
}
