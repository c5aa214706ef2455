// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BERT-style masked language model scorer
//!
//! Score of a candidate = logit of its first sub-token at the mask
//! position, minus 0.01 per sub-token so multi-piece words rank lower.

use anyhow::{Context, Result};
use ndarray::{Array2, IxDyn};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::info;

use super::MaskedScorer;
use crate::inference::{build_cpu_session, input_names, load_tokenizer, locate};

/// Penalty per candidate sub-token
pub const SUBTOKEN_PENALTY: f32 = 0.01;

/// Words kept on each side of the masked position
const CONTEXT_WORDS: usize = 64;

const MASK_TOKEN: &str = "[MASK]";

#[derive(Clone)]
pub struct OnnxMaskedScorer {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    mask_id: u32,
    wants_token_types: bool,
}

impl std::fmt::Debug for OnnxMaskedScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxMaskedScorer")
            .field("mask_id", &self.mask_id)
            .field("wants_token_types", &self.wants_token_types)
            .finish_non_exhaustive()
    }
}

impl OnnxMaskedScorer {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`
    pub fn new(model_dir: &Path) -> Result<Self> {
        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"))?;
        let mask_id = tokenizer
            .token_to_id(MASK_TOKEN)
            .context("Tokenizer has no [MASK] token")?;
        let session = build_cpu_session(&locate(model_dir, "model.onnx"), "Masked LM model")?;
        let wants_token_types = input_names(&session)
            .iter()
            .any(|n| n == "token_type_ids");

        info!("✅ Masked LM scorer loaded from {}", model_dir.display());
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            mask_id,
            wants_token_types,
        })
    }

    /// Logits over the vocabulary at the mask position
    fn mask_logits(&self, words: &[String], position: usize) -> Result<Vec<f32>> {
        let (context, masked) = masked_context(words, position, CONTEXT_WORDS);
        let encoding = self
            .tokenizer
            .encode(context.join(" "), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask_index = encoding
            .get_ids()
            .iter()
            .position(|&id| id == self.mask_id)
            .with_context(|| format!("Mask token lost while encoding position {}", masked))?;
        let len = ids.len();

        let input_ids = Array2::from_shape_vec((1, len), ids)?;
        let attention_mask = Array2::<i64>::ones((1, len));

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Masked LM session lock poisoned"))?;
        let outputs = if self.wants_token_types {
            session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids)?,
                "attention_mask" => Value::from_array(attention_mask)?,
                "token_type_ids" => Value::from_array(Array2::<i64>::zeros((1, len)))?
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => Value::from_array(input_ids)?,
                "attention_mask" => Value::from_array(attention_mask)?
            ])
        }
        .context("Masked LM inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract logits")?;
        let shape = logits.shape().to_vec();
        let [1, seq, vocab] = shape.as_slice() else {
            anyhow::bail!("Unexpected logits shape: {:?}", shape);
        };
        if mask_index >= *seq {
            anyhow::bail!("Mask index {} outside sequence of {}", mask_index, seq);
        }
        Ok((0..*vocab)
            .map(|v| logits[IxDyn(&[0, mask_index, v])])
            .collect())
    }
}

impl MaskedScorer for OnnxMaskedScorer {
    fn score(&self, words: &[String], position: usize, candidates: &[String]) -> Result<Vec<f32>> {
        let logits = self.mask_logits(words, position)?;

        candidates
            .iter()
            .map(|candidate| {
                let encoding = self
                    .tokenizer
                    .encode(candidate.as_str(), false)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;
                let pieces = encoding.get_ids();
                let first = *pieces
                    .first()
                    .with_context(|| format!("Candidate '{}' has no tokens", candidate))?;
                let logit = logits.get(first as usize).copied().unwrap_or(f32::MIN);
                Ok(logit - SUBTOKEN_PENALTY * pieces.len() as f32)
            })
            .collect()
    }
}

/// Words around `position` with that word replaced by the mask token
///
/// Returns the window and the index of the mask inside it.
pub fn masked_context(words: &[String], position: usize, radius: usize) -> (Vec<String>, usize) {
    let start = position.saturating_sub(radius);
    let end = (position + radius + 1).min(words.len());
    let window = words[start..end]
        .iter()
        .enumerate()
        .map(|(i, w)| {
            if start + i == position {
                MASK_TOKEN.to_string()
            } else {
                w.clone()
            }
        })
        .collect();
    (window, position - start)
}
