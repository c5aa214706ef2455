// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Handwriting recognizer (vision encoder + text decoder)

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;
use tracing::debug;

use super::preprocessing::{preprocess_for_handwriting, HANDWRITING_INPUT_SIZE};
use super::{LineRecognizer, Recognition};
use crate::inference::{load_tokenizer, EncoderInput, Seq2SeqModel};
use crate::vision::crop::Crop;

/// Upper bound on tokens per line
pub const MAX_LINE_TOKENS: usize = 64;

#[derive(Clone)]
pub struct HandwritingRecognizer {
    model: Seq2SeqModel,
    tokenizer: Arc<Tokenizer>,
}

impl std::fmt::Debug for HandwritingRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandwritingRecognizer")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl HandwritingRecognizer {
    /// Load encoder, decoder, tokenizer and generation ids from `model_dir`
    pub fn new(model_dir: &Path) -> Result<Self> {
        let model = Seq2SeqModel::load(model_dir, "Handwriting model", MAX_LINE_TOKENS)?;
        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"))?;
        Ok(Self {
            model,
            tokenizer: Arc::new(tokenizer),
        })
    }
}

impl LineRecognizer for HandwritingRecognizer {
    fn recognize(&self, crop: &Crop) -> Result<Recognition> {
        let pixels = preprocess_for_handwriting(&crop.image);
        let generation = self.model.generate(EncoderInput::Pixels(pixels))?;
        let text = self
            .tokenizer
            .decode(&generation.tokens, true)
            .map_err(|e| anyhow::anyhow!("Failed to decode handwriting tokens: {}", e))?;

        debug!("Handwriting line: '{}'", text.trim());
        Ok(Recognition::new(text.trim(), generation.mean_probability))
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        Some((HANDWRITING_INPUT_SIZE, HANDWRITING_INPUT_SIZE))
    }
}
