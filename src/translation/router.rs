// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Direct-or-pivot translation routing with a bounded model cache

use lru::LruCache;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, info, warn};

use super::{
    LanguagePair, ModelLoadError, TranslationError, TranslationModel, TranslationModelProvider,
};

type LoadResult = Result<Arc<dyn TranslationModel>, ModelLoadError>;

struct RouteCache {
    models: LruCache<LanguagePair, Arc<dyn TranslationModel>>,
    /// Pairs the provider reported as nonexistent
    missing: HashSet<LanguagePair>,
    /// Loads in progress; waiters share the loader's result
    loading: HashMap<LanguagePair, Arc<OnceLock<LoadResult>>>,
}

/// Picks `src -> tgt` directly, else `src -> pivot -> tgt`
pub struct TranslationRouter {
    provider: Arc<dyn TranslationModelProvider>,
    cache: Mutex<RouteCache>,
    pivot: String,
    loads: AtomicUsize,
}

impl std::fmt::Debug for TranslationRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationRouter")
            .field("pivot", &self.pivot)
            .field("loads", &self.load_count())
            .finish_non_exhaustive()
    }
}

impl TranslationRouter {
    pub fn new(
        provider: Arc<dyn TranslationModelProvider>,
        capacity: usize,
        pivot: impl Into<String>,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            provider,
            cache: Mutex::new(RouteCache {
                models: LruCache::new(capacity),
                missing: HashSet::new(),
                loading: HashMap::new(),
            }),
            pivot: pivot.into().trim().to_lowercase(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of provider loads attempted so far
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Pairs currently held, most recently used first
    pub fn cached_pairs(&self) -> Vec<LanguagePair> {
        self.cache
            .lock()
            .map(|c| c.models.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default()
    }

    /// Translate `text` from `source` to `target` (translation-side codes)
    pub fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let pair = LanguagePair::new(source, target);
        if pair.is_identity() {
            return Ok(text.to_string());
        }

        match self.model_for(&pair) {
            Ok(model) => {
                debug!("Direct route {}", pair);
                run(model.as_ref(), text)
            }
            Err(ModelLoadError::NotFound(_)) => self.pivot_translate(text, &pair),
            Err(ModelLoadError::Failed { pair, message }) => {
                Err(TranslationError::ModelLoad { pair, message })
            }
        }
    }

    fn pivot_translate(&self, text: &str, pair: &LanguagePair) -> Result<String, TranslationError> {
        if pair.source == self.pivot || pair.target == self.pivot {
            return Err(not_supported(pair, pair.clone()));
        }

        let first = LanguagePair::new(&pair.source, &self.pivot);
        let second = LanguagePair::new(&self.pivot, &pair.target);
        let to_pivot = self.model_for(&first).map_err(|e| load_failure(pair, e))?;
        let from_pivot = self.model_for(&second).map_err(|e| load_failure(pair, e))?;

        info!("Pivot route {} via {}", pair, self.pivot);
        let intermediate = run(to_pivot.as_ref(), text)?;
        run(from_pivot.as_ref(), &intermediate)
    }

    /// Cached model for `pair`, loading it at most once while cached
    ///
    /// The cache lock is never held across `provider.load`, so cached pairs
    /// stay usable while another pair loads. Concurrent callers for the same
    /// pair wait on one shared load.
    fn model_for(&self, pair: &LanguagePair) -> LoadResult {
        let slot = {
            let mut cache = self.lock_cache(pair)?;
            if let Some(model) = cache.models.get(pair) {
                return Ok(model.clone());
            }
            if cache.missing.contains(pair) {
                return Err(ModelLoadError::NotFound(pair.clone()));
            }
            cache
                .loading
                .entry(pair.clone())
                .or_insert_with(|| Arc::new(OnceLock::new()))
                .clone()
        };

        let mut loaded_here = false;
        let result = slot
            .get_or_init(|| {
                loaded_here = true;
                self.loads.fetch_add(1, Ordering::Relaxed);
                self.provider.load(pair)
            })
            .clone();

        if loaded_here {
            let mut cache = self.lock_cache(pair)?;
            cache.loading.remove(pair);
            match &result {
                Ok(model) => {
                    info!("Loaded translation model {}", pair);
                    if let Some((evicted, _)) = cache.models.push(pair.clone(), model.clone()) {
                        if evicted != *pair {
                            debug!("Evicted translation model {}", evicted);
                        }
                    }
                }
                Err(ModelLoadError::NotFound(p)) => {
                    debug!("No translation model for {}", p);
                    cache.missing.insert(p.clone());
                }
                Err(e) => warn!("{}", e),
            }
        }
        result
    }

    fn lock_cache(
        &self,
        pair: &LanguagePair,
    ) -> Result<std::sync::MutexGuard<'_, RouteCache>, ModelLoadError> {
        self.cache.lock().map_err(|_| ModelLoadError::Failed {
            pair: pair.clone(),
            message: "model cache lock poisoned".to_string(),
        })
    }
}

fn run(model: &dyn TranslationModel, text: &str) -> Result<String, TranslationError> {
    model
        .translate(text)
        .map_err(|e| TranslationError::Failed(e.to_string()))
}

fn not_supported(pair: &LanguagePair, missing: LanguagePair) -> TranslationError {
    TranslationError::NotSupported {
        from: pair.source.clone(),
        to: pair.target.clone(),
        missing,
    }
}

fn load_failure(pair: &LanguagePair, error: ModelLoadError) -> TranslationError {
    match error {
        ModelLoadError::NotFound(missing) => not_supported(pair, missing),
        ModelLoadError::Failed { pair, message } => TranslationError::ModelLoad { pair, message },
    }
}
