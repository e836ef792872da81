//! Mock config construction for tests
//!
//! Provides a baseline of small, CPU-friendly hyperparameters and overlays
//! caller overrides on top, so each test states only what it varies.

use anyhow::{bail, Result};
use serde_json::{json, Value};

use crate::config::SaeRunnerConfig;

/// Tiny model used throughout the test suite.
pub const TINYSTORIES_MODEL: &str = "tiny-stories-1M";
/// Full TinyStories dataset.
pub const TINYSTORIES_DATASET: &str = "roneneldan/TinyStories";
/// Small, non-streaming dataset for testing. HuggingFace gives too many
/// requests errors otherwise.
pub const NEEL_NANDA_C4_10K_DATASET: &str = "NeelNanda/c4-10k";
/// Checkpoint path every built config is pinned back to.
pub const DEFAULT_CHECKPOINT_PATH: &str = "test/checkpoints";

/// Baseline parameter values for a mock SAE runner config.
pub fn default_config_value() -> Value {
    json!({
        "model_name": TINYSTORIES_MODEL,
        "hook_name": "blocks.0.hook_mlp_out",
        "hook_layer": 0,
        "hook_head_index": null,
        "dataset_path": NEEL_NANDA_C4_10K_DATASET,
        "dataset_trust_remote_code": true,
        "streaming": false,
        "is_dataset_tokenized": false,
        "use_cached_activations": false,
        "architecture": "standard",
        "d_in": 64,
        "l1_coefficient": 2e-3,
        "lp_norm": 1.0,
        "lr": 2e-4,
        "train_batch_size_tokens": 4,
        "context_size": 6,
        "feature_sampling_window": 50,
        "dead_feature_threshold": 1e-7,
        "dead_feature_window": 1000,
        "n_batches_in_buffer": 2,
        "training_tokens": 1_000_000,
        "store_batch_size_prompts": 4,
        "log_to_wandb": false,
        "wandb_project": "test_project",
        "wandb_entity": "test_entity",
        "wandb_log_frequency": 10,
        "device": "cpu",
        "seed": 24,
        "checkpoint_path": DEFAULT_CHECKPOINT_PATH,
        "dtype": "float32",
        "prepend_bos": true,
        "normalize_activations": "none",
    })
}

/// Helper to create a mock SaeRunnerConfig.
///
/// `overrides` is a JSON object; its keys replace the baseline values and
/// are otherwise merged in unchecked, so a bad key or type fails inside the
/// config constructor, exactly as a hand-built config would.
///
/// The constructor appends a run identifier to `checkpoint_path`; tests need
/// a reproducible path, so it is reset afterwards to the caller's override
/// or to `DEFAULT_CHECKPOINT_PATH`.
///
/// ```
/// use sae_testbed::build_sae_cfg;
/// use serde_json::json;
///
/// let cfg = build_sae_cfg(json!({"d_in": 512, "lr": 1e-3})).unwrap();
/// assert_eq!(cfg.d_in, 512);
/// assert_eq!(cfg.checkpoint_path, "test/checkpoints");
/// ```
pub fn build_sae_cfg(overrides: Value) -> Result<SaeRunnerConfig> {
    let mut merged = default_config_value();

    match overrides {
        Value::Null => {}
        Value::Object(map) => {
            for (key, value) in map {
                merged[key] = value;
            }
        }
        other => bail!("Config overrides must be a JSON object, got: {other}"),
    }

    let checkpoint_path = merged["checkpoint_path"]
        .as_str()
        .unwrap_or(DEFAULT_CHECKPOINT_PATH)
        .to_string();

    let mut config = SaeRunnerConfig::from_value(merged)?;

    // Undo the run id the constructor appended.
    config.checkpoint_path = checkpoint_path;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_survive_empty_overrides() {
        let cfg = build_sae_cfg(json!({})).unwrap();
        assert_eq!(cfg.model_name, TINYSTORIES_MODEL);
        assert_eq!(cfg.dataset_path, NEEL_NANDA_C4_10K_DATASET);
        assert_eq!(cfg.hook_name, "blocks.0.hook_mlp_out");
        assert_eq!(cfg.d_in, 64);
        assert_eq!(cfg.lr, 2e-4);
        assert_eq!(cfg.device, "cpu");
        assert_eq!(cfg.seed, 24);
        assert_eq!(cfg.checkpoint_path, DEFAULT_CHECKPOINT_PATH);
    }

    #[test]
    fn test_null_overrides_is_empty() {
        let cfg = build_sae_cfg(Value::Null).unwrap();
        assert_eq!(cfg.d_in, 64);
    }

    #[test]
    fn test_override_replaces_default() {
        let cfg = build_sae_cfg(json!({"d_in": 128, "lr": 1e-3})).unwrap();
        assert_eq!(cfg.d_in, 128);
        assert_eq!(cfg.lr, 1e-3);
        // untouched fields keep their baseline values
        assert_eq!(cfg.context_size, 6);
        assert_eq!(cfg.train_batch_size_tokens, 4);
    }

    #[test]
    fn test_checkpoint_path_override_is_exact() {
        let cfg = build_sae_cfg(json!({"checkpoint_path": "other/dir"})).unwrap();
        assert_eq!(cfg.checkpoint_path, "other/dir");
    }

    #[test]
    fn test_non_object_overrides_fail() {
        assert!(build_sae_cfg(json!([1, 2, 3])).is_err());
        assert!(build_sae_cfg(json!("d_in=64")).is_err());
    }

    #[test]
    fn test_constructor_errors_pass_through() {
        // wrong type
        assert!(build_sae_cfg(json!({"d_in": "sixty-four"})).is_err());
        // unknown key
        assert!(build_sae_cfg(json!({"d_out": 64})).is_err());
        // constraint violation
        assert!(build_sae_cfg(json!({"lr": 0.0})).is_err());
    }
}
