// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Translation
//!
//! Two backends:
//! - `router`: per-pair sequence models with a direct route or a pivot
//!   through English, cached in a bounded LRU
//! - `llm`: a chat-style generative service that translates in one call

pub mod llm;
pub mod marian;
pub mod router;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use llm::LlmTranslator;
pub use marian::{MarianModel, MarianOnnxProvider};
pub use router::TranslationRouter;

/// Translation-side `(source, target)` codes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.trim().to_lowercase(),
            target: target.trim().to_lowercase(),
        }
    }

    /// Source equals target: text passes through untouched
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslationError {
    #[error("Translation from {from} to {to} is not supported (no model for {missing})")]
    NotSupported {
        from: String,
        to: String,
        missing: LanguagePair,
    },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to load translation model {pair}: {message}")]
    ModelLoad { pair: LanguagePair, message: String },

    #[error("Translation failed: {0}")]
    Failed(String),

    #[error("Translation service error: {0}")]
    Service(String),

    #[error("Translation service timed out after {0}s")]
    Timeout(u64),
}

/// Why a pair's model could not be produced
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelLoadError {
    /// No model exists for this pair
    #[error("No translation model for {0}")]
    NotFound(LanguagePair),

    /// A model exists but could not be loaded
    #[error("Translation model {pair} failed to load: {message}")]
    Failed { pair: LanguagePair, message: String },
}

/// One loaded direction
pub trait TranslationModel: Send + Sync {
    fn translate(&self, text: &str) -> anyhow::Result<String>;
}

/// Produces models for language pairs
pub trait TranslationModelProvider: Send + Sync {
    fn load(&self, pair: &LanguagePair) -> Result<Arc<dyn TranslationModel>, ModelLoadError>;
}

/// Generative translation service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
    pub num_ctx: u32,
    pub num_predict: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "phi4-mini".to_string(),
            timeout_secs: 60,
            num_ctx: 8192,
            num_predict: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Loaded pair models kept at once
    pub cache_capacity: usize,
    pub pivot_language: String,
    /// Generation cap per translated line
    pub max_new_tokens: usize,
    pub llm: LlmConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 8,
            pivot_language: "en".to_string(),
            max_new_tokens: 512,
            llm: LlmConfig::default(),
        }
    }
}
