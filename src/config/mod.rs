// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Values come from three layers, applied in order:
//! 1. built-in defaults
//! 2. an optional TOML file (`--config` or `APP_CONFIG`)
//! 3. environment variable overrides

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::correction::CorrectionConfig;
use crate::pipeline::PipelineConfig;
use crate::translation::TranslationConfig;
use crate::vision::classifier::{ClassifierConfig, TextTypeStrategy};
use crate::vision::language::{LanguageConfig, LanguageStrategy};

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("Invalid configuration for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5005,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Locations of the model files loaded at startup
///
/// A missing entry (or missing files) disables that service; the node
/// keeps serving with whatever did load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPaths {
    /// Detector and per-language printed recognizers
    /// (`det_model.onnx`, `rec_model_{lang}.onnx`, `keys_{lang}.txt`)
    pub ocr_model_dir: Option<PathBuf>,
    /// Vision encoder-decoder handwriting model
    /// (`encoder_model.onnx`, `decoder_model.onnx`, `tokenizer.json`)
    pub handwriting_model_dir: Option<PathBuf>,
    /// Masked-LM scorer (`model.onnx`, `tokenizer.json`)
    pub mlm_model_dir: Option<PathBuf>,
    /// Correction vocabulary, one word per line
    pub vocabulary_path: Option<PathBuf>,
    /// Root of the `opus-mt-{src}-{tgt}` translation model directories
    pub translation_model_dir: Option<PathBuf>,
}

impl ModelPaths {
    /// Lay out the default model directories under one root
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            ocr_model_dir: Some(root.join("ocr-onnx")),
            handwriting_model_dir: Some(root.join("handwriting-onnx")),
            mlm_model_dir: Some(root.join("mlm-onnx")),
            vocabulary_path: Some(root.join("vocabulary.txt")),
            translation_model_dir: Some(root.join("translation")),
        }
    }
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::under("./models")
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelPaths,
    pub pipeline: PipelineConfig,
    pub classifier: ClassifierConfig,
    pub language: LanguageConfig,
    pub correction: CorrectionConfig,
    pub translation: TranslationConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Resolve the full configuration: optional file, then environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file_path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var("APP_CONFIG").ok().map(PathBuf::from));

        let mut config = match file_path {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides in place
    pub fn apply_env(&mut self) {
        if let Ok(host) = env::var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse("API_PORT") {
            self.server.port = port;
        }

        if let Ok(root) = env::var("MODELS_DIR") {
            self.models = ModelPaths::under(root);
        }
        if let Ok(dir) = env::var("OCR_MODEL_DIR") {
            self.models.ocr_model_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = env::var("HANDWRITING_MODEL_DIR") {
            self.models.handwriting_model_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = env::var("MLM_MODEL_DIR") {
            self.models.mlm_model_dir = Some(PathBuf::from(dir));
        }
        if let Ok(path) = env::var("VOCABULARY_PATH") {
            self.models.vocabulary_path = Some(PathBuf::from(path));
        }
        if let Ok(dir) = env::var("TRANSLATION_MODEL_DIR") {
            self.models.translation_model_dir = Some(PathBuf::from(dir));
        }

        if let Some(capacity) = env_parse("TRANSLATION_CACHE_CAPACITY") {
            self.translation.cache_capacity = capacity;
        }
        if let Ok(endpoint) = env::var("LLM_ENDPOINT") {
            self.translation.llm.endpoint = endpoint;
        }
        if let Ok(model) = env::var("LLM_MODEL") {
            self.translation.llm.model = model;
        }
        if let Some(secs) = env_parse("LLM_TIMEOUT_SECS") {
            self.translation.llm.timeout_secs = secs;
        }

        if let Ok(strategy) = env::var("TEXT_TYPE_STRATEGY") {
            match strategy.parse::<TextTypeStrategy>() {
                Ok(s) => self.classifier.strategy = s,
                Err(e) => tracing::warn!("Ignoring TEXT_TYPE_STRATEGY: {}", e),
            }
        }
        if let Ok(strategy) = env::var("LANGUAGE_STRATEGY") {
            match strategy.parse::<LanguageStrategy>() {
                Ok(s) => self.language.strategy = s,
                Err(e) => tracing::warn!("Ignoring LANGUAGE_STRATEGY: {}", e),
            }
        }
        if let Ok(list) = env::var("SUPPORTED_LANGUAGES") {
            self.language.supported = list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(v) = env::var("CORRECTION_ENABLED") {
            self.correction.enabled = v.to_lowercase() == "true" || v == "1";
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.pipeline.line_overlap_ratio;
        if !(ratio > 0.0 && ratio <= 2.0) {
            return Err(invalid(
                "pipeline.line_overlap_ratio",
                format!("must be in (0, 2], got {}", ratio),
            ));
        }
        if !(0.0..=1.0).contains(&self.pipeline.confidence_cutoff) {
            return Err(invalid(
                "pipeline.confidence_cutoff",
                "must be between 0 and 1",
            ));
        }
        if self.translation.cache_capacity == 0 {
            return Err(invalid(
                "translation.cache_capacity",
                "must be at least 1",
            ));
        }
        if self.translation.llm.timeout_secs == 0 {
            return Err(invalid(
                "translation.llm.timeout_secs",
                "must be at least 1",
            ));
        }
        if self.language.supported.is_empty() {
            return Err(invalid(
                "language.supported",
                "at least one language is required",
            ));
        }
        if self.correction.max_candidates == 0 {
            return Err(invalid(
                "correction.max_candidates",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        message: message.into(),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
