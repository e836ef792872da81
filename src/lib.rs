// Pedantic clippy configuration for ML test-support code
#![allow(clippy::module_name_repetitions)] // SaeRunnerConfig in config.rs is fine
#![allow(clippy::doc_markdown)] // backticks for every technical term is excessive
#![allow(clippy::missing_errors_doc)] // # Errors section for every Result fn
#![allow(clippy::must_use_candidate)] // #[must_use] on every pure fn is excessive
#![allow(clippy::float_cmp)] // exact comparison against documented defaults in tests

//! sae-testbed: test-support scaffolding for SAE training experiments
//!
//! Shared fixtures for the sparse-autoencoder test suite: logging setup,
//! a mock config builder, and a cached loader for pretrained models so each
//! model is downloaded and initialized at most once per test process.
//!
//! ## Architecture
//!
//! - `logging`: one-shot tracing setup with noisy HTTP targets silenced
//! - `config`: SaeRunnerConfig, the validated runner configuration
//! - `builder`: build_sae_cfg, baseline defaults overlaid with overrides
//! - `model`: HookedModel, a pretrained model loaded from HuggingFace
//! - `cache`: ModelCache, single-flight memoized loading with copy-on-read

pub mod builder;
pub mod cache;
pub mod config;
pub mod logging;
pub mod model;

pub use builder::{
    build_sae_cfg, DEFAULT_CHECKPOINT_PATH, NEEL_NANDA_C4_10K_DATASET, TINYSTORIES_DATASET,
    TINYSTORIES_MODEL,
};
pub use cache::{DeepClone, ModelCache};
pub use config::{SaeRunnerConfig, ALL_ARCHITECTURES};
pub use logging::init_test_logging;
pub use model::HookedModel;
