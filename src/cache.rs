//! Memoized model loading for the test suite
//!
//! Loading a pretrained model means a network fetch plus tensor
//! initialization, so each distinct model should be loaded at most once per
//! process. The cache is an explicit object owned by the test harness rather
//! than process-global state, which keeps fixtures isolated and lets tests
//! inject their own loader.
//!
//! Callers never see the canonical cached instance: every `get` returns a
//! deep copy, so one test mutating its model cannot leak state into another
//! test or back into the cache. Entries are never evicted; the set of
//! distinct model names in a test run is small.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use candle_core::Device;
use tracing::{debug, info};

use crate::model::HookedModel;

/// Explicit deep-copy capability for cached resources.
///
/// `deep_clone` must return an instance sharing no mutable state with
/// `self`; the cache hands these copies to callers while keeping the
/// canonical instance private.
pub trait DeepClone: Sized {
    fn deep_clone(&self) -> Result<Self>;
}

impl DeepClone for HookedModel {
    fn deep_clone(&self) -> Result<Self> {
        HookedModel::deep_clone(self)
    }
}

type Loader<R> = dyn Fn(&str) -> Result<R> + Send + Sync;

/// One cache slot per model name. The slot's own mutex serializes loading,
/// so concurrent first requests for the same name perform a single load.
type Slot<R> = Arc<Mutex<Option<R>>>;

/// Cache of loaded models, keyed by model name.
pub struct ModelCache<R = HookedModel> {
    loader: Box<Loader<R>>,
    slots: Mutex<HashMap<String, Slot<R>>>,
}

impl ModelCache<HookedModel> {
    /// Cache that loads models from HuggingFace onto the given device.
    pub fn new(device: Device) -> Self {
        Self::with_loader(move |name| HookedModel::from_pretrained(name, &device))
    }
}

impl<R: DeepClone> ModelCache<R> {
    /// Cache with an injected loader, for fixtures that stub out the
    /// network fetch.
    pub fn with_loader(loader: impl Fn(&str) -> Result<R> + Send + Sync + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Get a model by name, loading it on first request.
    ///
    /// Returns an independent deep copy of the cached instance. A failed
    /// load is not cached; the next request retries.
    pub fn get(&self, model_name: &str) -> Result<R> {
        let slot = {
            let mut slots = self
                .slots
                .lock()
                .map_err(|_| anyhow!("Model cache lock poisoned"))?;
            Arc::clone(slots.entry(model_name.to_string()).or_default())
        };

        // Outer map lock is released; only requests for this name block here.
        let mut entry = slot
            .lock()
            .map_err(|_| anyhow!("Cache slot lock poisoned for '{model_name}'"))?;

        if entry.is_none() {
            info!("Model cache miss, loading: {}", model_name);
            *entry = Some((self.loader)(model_name)?);
        } else {
            debug!("Model cache hit: {}", model_name);
        }

        let canonical = entry
            .as_ref()
            .ok_or_else(|| anyhow!("Cache slot empty after load for '{model_name}'"))?;

        // Copy here to prevent sharing state across tests.
        canonical.deep_clone()
    }

    /// Whether a loaded model is cached under this name.
    pub fn contains(&self, model_name: &str) -> bool {
        self.slots
            .lock()
            .ok()
            .and_then(|slots| {
                let slot = slots.get(model_name)?;
                let entry = slot.lock().ok()?;
                Some(entry.is_some())
            })
            .unwrap_or(false)
    }

    /// Number of models currently loaded.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .map(|slots| {
                slots
                    .values()
                    .filter(|slot| slot.lock().map(|e| e.is_some()).unwrap_or(false))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Whether no model has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
