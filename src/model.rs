//! HookedModel wrapper for pretrained language models
//!
//! Loads a model's config, tokenizer, and weights from HuggingFace and keeps
//! the weights as named tensors. The SAE test suite only needs shapes,
//! tokenization, and raw parameters, not a full forward pass.

use std::collections::HashMap;

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::info;

/// Short model names used by the test suite, mapped to HuggingFace repos.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("tiny-stories-1M", "roneneldan/TinyStories-1M"),
    ("tiny-stories-3M", "roneneldan/TinyStories-3M"),
    ("tiny-stories-33M", "roneneldan/TinyStories-33M"),
    ("gpt2", "openai-community/gpt2"),
];

/// Resolve a short model name to its HuggingFace repo id.
///
/// Unknown names pass through unchanged and are treated as repo ids.
pub fn resolve_hf_repo(model_name: &str) -> &str {
    MODEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == model_name)
        .map_or(model_name, |(_, repo)| *repo)
}

/// Model dimensions parsed from config.json.
///
/// Aliases cover the GPT-Neo and GPT-2 key spellings, since the TinyStories
/// models are GPT-Neo checkpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(alias = "num_layers", alias = "n_layer")]
    pub num_hidden_layers: usize,
    #[serde(alias = "n_embd")]
    pub hidden_size: usize,
    pub vocab_size: usize,
}

/// A pretrained model loaded for SAE tests.
///
/// Owns the tokenizer and every weight tensor. Loading is expensive (network
/// fetch plus tensor initialization), so tests go through `cache::ModelCache`
/// instead of calling `from_pretrained` directly.
pub struct HookedModel {
    model_id: String,
    config: ModelConfig,
    tokenizer: Tokenizer,
    weights: HashMap<String, Tensor>,
    device: Device,
}

impl HookedModel {
    /// Load a model from HuggingFace onto the given device.
    pub fn from_pretrained(model_name: &str, device: &Device) -> Result<Self> {
        let repo_id = resolve_hf_repo(model_name);
        info!("Loading model: {} ({})", model_name, repo_id);

        let api = Api::new()?;
        let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .context("Failed to download config.json")?;
        let config_str = std::fs::read_to_string(&config_path).context("Failed to read config")?;
        let config: ModelConfig = serde_json::from_str(&config_str)?;
        info!(
            "Model config: {} layers, {} hidden, {} vocab",
            config.num_hidden_layers, config.hidden_size, config.vocab_size
        );

        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to download tokenizer.json")?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Tokenizer error: {e}"))?;

        let weights_path = repo
            .get("model.safetensors")
            .context("Failed to download model.safetensors")?;
        let weights = candle_core::safetensors::load(&weights_path, device)?;
        info!("Loaded {} weight tensors", weights.len());

        Ok(Self {
            model_id: model_name.to_string(),
            config,
            tokenizer,
            weights,
            device: device.clone(),
        })
    }

    /// Get the model ID
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Number of transformer layers
    pub fn n_layers(&self) -> usize {
        self.config.num_hidden_layers
    }

    /// Residual stream width
    pub fn d_model(&self) -> usize {
        self.config.hidden_size
    }

    /// Vocabulary size
    pub fn vocab_size(&self) -> usize {
        self.config.vocab_size
    }

    /// Device the weights live on
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Look up a weight tensor by name
    pub fn weight(&self, name: &str) -> Option<&Tensor> {
        self.weights.get(name)
    }

    /// Replace a weight tensor, e.g. to ablate a parameter in a test.
    pub fn set_weight(&mut self, name: &str, tensor: Tensor) {
        self.weights.insert(name.to_string(), tensor);
    }

    /// Tokenize text into model token ids
    pub fn to_tokens(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization error: {e}"))?;
        Ok(encoding.get_ids().to_vec())
    }

    /// Full independent copy of this model.
    ///
    /// Every weight tensor is copied into fresh storage, so mutating the
    /// clone (or the original) never affects the other. This is the clone
    /// contract `cache::ModelCache` relies on to hand out per-test copies.
    pub fn deep_clone(&self) -> Result<Self> {
        let mut weights = HashMap::with_capacity(self.weights.len());
        for (name, tensor) in &self.weights {
            weights.insert(name.clone(), tensor.copy()?);
        }
        Ok(Self {
            model_id: self.model_id.clone(),
            config: self.config.clone(),
            tokenizer: self.tokenizer.clone(),
            weights,
            device: self.device.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolution() {
        assert_eq!(resolve_hf_repo("tiny-stories-1M"), "roneneldan/TinyStories-1M");
        assert_eq!(resolve_hf_repo("gpt2"), "openai-community/gpt2");
        // unknown names are already repo ids
        assert_eq!(resolve_hf_repo("roneneldan/TinyStories"), "roneneldan/TinyStories");
    }

    #[test]
    fn test_config_parses_gpt_neo_keys() {
        let config: ModelConfig = serde_json::from_str(
            r#"{"num_layers": 8, "hidden_size": 64, "vocab_size": 50257}"#,
        )
        .unwrap();
        assert_eq!(config.num_hidden_layers, 8);
        assert_eq!(config.hidden_size, 64);
    }

    #[test]
    fn test_config_parses_gpt2_keys() {
        let config: ModelConfig =
            serde_json::from_str(r#"{"n_layer": 12, "n_embd": 768, "vocab_size": 50257}"#).unwrap();
        assert_eq!(config.num_hidden_layers, 12);
        assert_eq!(config.hidden_size, 768);
    }
}
