//! SAE runner configuration
//!
//! The configuration type consumed by the training runner. Tests construct
//! instances through `builder::build_sae_cfg` rather than literal structs so
//! they only spell out the fields they care about.

use anyhow::{bail, Context, Result};
use candle_core::Device;
use serde::{Deserialize, Serialize};

/// Every SAE architecture the runner can train.
pub const ALL_ARCHITECTURES: &[&str] = &["standard", "gated", "jumprelu", "topk"];

/// Activation normalization strategies understood by the runner.
const NORMALIZE_STRATEGIES: &[&str] = &[
    "none",
    "expected_average_only_in",
    "constant_norm_rescale",
    "layer_norm",
];

/// Configuration for a language-model SAE training run.
///
/// Constructed from a JSON object via `from_value`, which validates the
/// hyperparameters and appends a fresh run identifier to `checkpoint_path`
/// so that concurrent runs never write into the same directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaeRunnerConfig {
    pub model_name: String,
    pub hook_name: String,
    pub hook_layer: usize,
    pub hook_head_index: Option<usize>,
    pub dataset_path: String,
    pub dataset_trust_remote_code: bool,
    pub streaming: bool,
    pub is_dataset_tokenized: bool,
    pub use_cached_activations: bool,
    pub architecture: String,
    pub d_in: usize,
    pub l1_coefficient: f64,
    pub lp_norm: f64,
    pub lr: f64,
    pub train_batch_size_tokens: usize,
    pub context_size: usize,
    pub feature_sampling_window: usize,
    pub dead_feature_threshold: f64,
    pub dead_feature_window: usize,
    pub n_batches_in_buffer: usize,
    pub training_tokens: u64,
    pub store_batch_size_prompts: usize,
    pub log_to_wandb: bool,
    pub wandb_project: String,
    pub wandb_entity: String,
    pub wandb_log_frequency: usize,
    pub device: String,
    pub seed: u64,
    pub checkpoint_path: String,
    pub dtype: String,
    pub prepend_bos: bool,
    pub normalize_activations: String,
}

impl SaeRunnerConfig {
    /// Build a config from a JSON object of parameter values.
    ///
    /// Unknown keys and wrong types fail deserialization; constraint
    /// violations fail validation. On success the `checkpoint_path` has a
    /// run identifier appended, e.g. `test/checkpoints/a1b2c3d4`.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let mut config: Self =
            serde_json::from_value(value).context("Invalid SAE runner config")?;
        config.validate()?;
        config.checkpoint_path = format!("{}/{}", config.checkpoint_path, new_run_id());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.d_in == 0 {
            bail!("d_in must be positive");
        }
        if self.context_size == 0 {
            bail!("context_size must be positive");
        }
        if self.train_batch_size_tokens == 0 {
            bail!("train_batch_size_tokens must be positive");
        }
        if self.training_tokens == 0 {
            bail!("training_tokens must be positive");
        }
        if self.lr <= 0.0 {
            bail!("lr must be positive, got {}", self.lr);
        }
        if self.lp_norm <= 0.0 {
            bail!("lp_norm must be positive, got {}", self.lp_norm);
        }
        if self.l1_coefficient < 0.0 {
            bail!("l1_coefficient must be non-negative, got {}", self.l1_coefficient);
        }
        if !matches!(self.dtype.as_str(), "float32" | "float16" | "bfloat16") {
            bail!("Unsupported dtype: {}", self.dtype);
        }
        if !NORMALIZE_STRATEGIES.contains(&self.normalize_activations.as_str()) {
            bail!(
                "Unknown normalize_activations strategy: {}",
                self.normalize_activations
            );
        }
        if !ALL_ARCHITECTURES.contains(&self.architecture.as_str()) {
            bail!("Unknown SAE architecture: {}", self.architecture);
        }
        Ok(())
    }

    /// Parse the `device` field into a candle device.
    ///
    /// Accepts "cpu", "cuda", and "cuda:N".
    pub fn device(&self) -> Result<Device> {
        match self.device.as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Device::new_cuda(0).context("CUDA device unavailable"),
            other => {
                if let Some(ordinal) = other.strip_prefix("cuda:") {
                    let ordinal: usize = ordinal
                        .parse()
                        .with_context(|| format!("Invalid CUDA ordinal in '{other}'"))?;
                    Device::new_cuda(ordinal).context("CUDA device unavailable")
                } else {
                    bail!("Unsupported device: {other}")
                }
            }
        }
    }
}

/// Fresh random run identifier, appended to checkpoint paths.
fn new_run_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::default_config_value;

    #[test]
    fn test_from_value_appends_run_id() {
        let cfg = SaeRunnerConfig::from_value(default_config_value()).unwrap();
        assert!(cfg.checkpoint_path.starts_with("test/checkpoints/"));
        assert_ne!(cfg.checkpoint_path, "test/checkpoints");
    }

    #[test]
    fn test_run_ids_are_unique_per_construction() {
        let a = SaeRunnerConfig::from_value(default_config_value()).unwrap();
        let b = SaeRunnerConfig::from_value(default_config_value()).unwrap();
        assert_ne!(a.checkpoint_path, b.checkpoint_path);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut value = default_config_value();
        value["not_a_real_field"] = serde_json::json!(1);
        assert!(SaeRunnerConfig::from_value(value).is_err());
    }

    #[test]
    fn test_bad_dtype_is_rejected() {
        let mut value = default_config_value();
        value["dtype"] = serde_json::json!("int8");
        let err = SaeRunnerConfig::from_value(value).unwrap_err();
        assert!(err.to_string().contains("dtype"));
    }

    #[test]
    fn test_bad_architecture_is_rejected() {
        let mut value = default_config_value();
        value["architecture"] = serde_json::json!("transcoder");
        assert!(SaeRunnerConfig::from_value(value).is_err());
    }

    #[test]
    fn test_cpu_device_parses() {
        let cfg = SaeRunnerConfig::from_value(default_config_value()).unwrap();
        assert!(matches!(cfg.device().unwrap(), Device::Cpu));
    }
}
