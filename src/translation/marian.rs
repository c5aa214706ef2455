// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Marian-style ONNX translation models
//!
//! One exported directory per direction:
//! `{root}/opus-mt-{src}-{tgt}/` with `encoder_model.onnx`,
//! `decoder_model.onnx`, `tokenizer.json` and `config.json`.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::Tokenizer;
use tracing::debug;

use super::{LanguagePair, ModelLoadError, TranslationModel, TranslationModelProvider};
use crate::inference::{load_tokenizer, EncoderInput, Seq2SeqModel};

/// Source tokens fed to the encoder per line
const MAX_SOURCE_TOKENS: usize = 512;

pub struct MarianModel {
    model: Seq2SeqModel,
    tokenizer: Arc<Tokenizer>,
}

impl MarianModel {
    pub fn load(dir: &Path, max_new_tokens: usize) -> Result<Self> {
        let model = Seq2SeqModel::load(dir, "Translation model", max_new_tokens)?;
        let tokenizer = load_tokenizer(&dir.join("tokenizer.json"))?;
        Ok(Self {
            model,
            tokenizer: Arc::new(tokenizer),
        })
    }

    fn translate_line(&self, line: &str) -> Result<String> {
        let encoding = self
            .tokenizer
            .encode(line, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;
        let mut ids = encoding.get_ids().to_vec();
        if ids.len() > MAX_SOURCE_TOKENS {
            debug!("Truncating source line from {} tokens", ids.len());
            // Keep the trailing end-of-sequence token
            let eos = ids.last().copied();
            ids.truncate(MAX_SOURCE_TOKENS - 1);
            ids.extend(eos);
        }

        let generation = self.model.generate(EncoderInput::Tokens(ids))?;
        let text = self
            .tokenizer
            .decode(&generation.tokens, true)
            .map_err(|e| anyhow::anyhow!("Failed to decode translation: {}", e))?;
        Ok(text.trim().to_string())
    }
}

impl TranslationModel for MarianModel {
    /// Lines are translated independently so line breaks survive
    fn translate(&self, text: &str) -> Result<String> {
        text.lines()
            .map(|line| {
                if line.trim().is_empty() {
                    Ok(String::new())
                } else {
                    self.translate_line(line.trim())
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(|lines| lines.join("\n"))
    }
}

/// Loads `opus-mt-{src}-{tgt}` directories under a root
#[derive(Debug, Clone)]
pub struct MarianOnnxProvider {
    root: PathBuf,
    max_new_tokens: usize,
}

impl MarianOnnxProvider {
    pub fn new(root: impl Into<PathBuf>, max_new_tokens: usize) -> Self {
        Self {
            root: root.into(),
            max_new_tokens,
        }
    }

    pub fn model_dir(&self, pair: &LanguagePair) -> PathBuf {
        self.root
            .join(format!("opus-mt-{}-{}", pair.source, pair.target))
    }

    /// Pairs with a model directory on disk
    pub fn available_pairs(&self) -> Vec<LanguagePair> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };
        let mut pairs: Vec<LanguagePair> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| parse_model_dir(&e.file_name().to_string_lossy()))
            .collect();
        pairs.sort();
        pairs
    }
}

impl TranslationModelProvider for MarianOnnxProvider {
    fn load(&self, pair: &LanguagePair) -> Result<Arc<dyn TranslationModel>, ModelLoadError> {
        let dir = self.model_dir(pair);
        if !dir.is_dir() {
            return Err(ModelLoadError::NotFound(pair.clone()));
        }
        MarianModel::load(&dir, self.max_new_tokens)
            .map(|m| Arc::new(m) as Arc<dyn TranslationModel>)
            .map_err(|e| ModelLoadError::Failed {
                pair: pair.clone(),
                message: e.to_string(),
            })
    }
}

/// `opus-mt-fr-en` -> `fr-en`
fn parse_model_dir(name: &str) -> Option<LanguagePair> {
    let rest = name.strip_prefix("opus-mt-")?;
    let (source, target) = rest.split_once('-')?;
    if source.is_empty() || target.is_empty() {
        return None;
    }
    Some(LanguagePair::new(source, target))
}
