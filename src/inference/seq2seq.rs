// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Encoder-decoder greedy generation
//!
//! Works with the common HuggingFace ONNX export layout
//! (`encoder_model.onnx`, `decoder_model.onnx`, `config.json` /
//! `generation_config.json`). The decoder is run without a KV cache: every
//! step feeds the full prefix, which is fine for short line transcripts and
//! sentence-sized translations.

use anyhow::{Context, Result};
use ndarray::{Array2, Array4, ArrayD, IxDyn};
use ort::session::Session;
use ort::value::Value;
use serde_json::Value as Json;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::session::{build_cpu_session, input_names, locate};

/// Token ids that drive generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationConfig {
    pub decoder_start_token_id: u32,
    pub eos_token_id: u32,
    /// Never emitted (Marian uses it as the start token)
    pub pad_token_id: Option<u32>,
    pub max_new_tokens: usize,
}

impl GenerationConfig {
    /// Read ids from `generation_config.json`, falling back to `config.json`
    pub fn from_model_dir(dir: &Path, max_new_tokens: usize) -> Result<Self> {
        for name in ["generation_config.json", "config.json"] {
            let path = dir.join(name);
            if !path.exists() {
                continue;
            }
            let raw = std::fs::read_to_string(&path)
                .context(format!("Failed to read {}", path.display()))?;
            let json: Json = serde_json::from_str(&raw)
                .context(format!("Failed to parse {}", path.display()))?;
            if let Some(config) = Self::from_json(&json, max_new_tokens) {
                return Ok(config);
            }
        }
        anyhow::bail!(
            "No decoder_start_token_id/eos_token_id found in {}",
            dir.display()
        )
    }

    /// Extract ids from a config document; `None` if either id is missing
    pub fn from_json(json: &Json, max_new_tokens: usize) -> Option<Self> {
        let id = |key: &str| -> Option<u32> {
            match json.get(key)? {
                Json::Number(n) => n.as_u64().map(|v| v as u32),
                // eos_token_id may be a list
                Json::Array(items) => items.first()?.as_u64().map(|v| v as u32),
                _ => None,
            }
        };

        let pad_token_id = id("pad_token_id");
        let decoder_start_token_id = id("decoder_start_token_id").or(pad_token_id)?;
        Some(Self {
            decoder_start_token_id,
            eos_token_id: id("eos_token_id")?,
            pad_token_id,
            max_new_tokens,
        })
    }
}

/// What the encoder consumes
#[derive(Debug, Clone)]
pub enum EncoderInput {
    /// Normalized NCHW image tensor (`pixel_values`)
    Pixels(Array4<f32>),
    /// Source token ids (`input_ids` + `attention_mask`)
    Tokens(Vec<u32>),
}

/// Generated ids (without start/eos) and the mean chosen-token probability
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub tokens: Vec<u32>,
    pub mean_probability: f32,
}

/// Encoder + decoder session pair
#[derive(Clone)]
pub struct Seq2SeqModel {
    encoder: Arc<Mutex<Session>>,
    decoder: Arc<Mutex<Session>>,
    /// Some exports declare `encoder_attention_mask`, some do not
    decoder_wants_mask: bool,
    config: GenerationConfig,
}

impl std::fmt::Debug for Seq2SeqModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seq2SeqModel")
            .field("decoder_wants_mask", &self.decoder_wants_mask)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Seq2SeqModel {
    /// Load `encoder_model.onnx` and `decoder_model.onnx` from `dir`
    pub fn load(dir: &Path, label: &str, max_new_tokens: usize) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("{} directory not found: {}", label, dir.display());
        }

        let encoder = build_cpu_session(
            &locate(dir, "encoder_model.onnx"),
            &format!("{} encoder", label),
        )?;
        let decoder = build_cpu_session(
            &locate(dir, "decoder_model.onnx"),
            &format!("{} decoder", label),
        )?;
        let decoder_wants_mask = input_names(&decoder)
            .iter()
            .any(|n| n == "encoder_attention_mask");
        let config = GenerationConfig::from_model_dir(dir, max_new_tokens)?;

        info!(
            "✅ {} loaded from {} (start={}, eos={})",
            label,
            dir.display(),
            config.decoder_start_token_id,
            config.eos_token_id
        );

        Ok(Self {
            encoder: Arc::new(Mutex::new(encoder)),
            decoder: Arc::new(Mutex::new(decoder)),
            decoder_wants_mask,
            config,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Greedy decode until eos or `max_new_tokens`
    pub fn generate(&self, input: EncoderInput) -> Result<Generation> {
        let hidden = self.encode(input)?;
        let encoder_len = hidden.shape().get(1).copied().unwrap_or(0);

        let mut tokens = vec![self.config.decoder_start_token_id];
        let mut probabilities = Vec::new();
        let excluded: Vec<u32> = self.config.pad_token_id.into_iter().collect();

        for _ in 0..self.config.max_new_tokens {
            let logits = self.step(&hidden, encoder_len, &tokens)?;
            let (next, probability) = argmax_excluding(&logits, &excluded)
                .ok_or_else(|| anyhow::anyhow!("Decoder produced empty logits"))?;
            if next == self.config.eos_token_id {
                break;
            }
            tokens.push(next);
            probabilities.push(probability);
        }

        let mean_probability = if probabilities.is_empty() {
            0.0
        } else {
            probabilities.iter().sum::<f32>() / probabilities.len() as f32
        };
        debug!("Generated {} tokens", probabilities.len());

        Ok(Generation {
            tokens: tokens.split_off(1),
            mean_probability,
        })
    }

    fn encode(&self, input: EncoderInput) -> Result<ArrayD<f32>> {
        let mut session = self
            .encoder
            .lock()
            .map_err(|_| anyhow::anyhow!("Encoder session lock poisoned"))?;

        let outputs = match input {
            EncoderInput::Pixels(pixels) => session
                .run(ort::inputs![
                    "pixel_values" => Value::from_array(pixels).context("Failed to create pixel tensor")?
                ])
                .context("Encoder inference failed")?,
            EncoderInput::Tokens(ids) => {
                let len = ids.len();
                let ids = Array2::from_shape_vec(
                    (1, len),
                    ids.into_iter().map(|id| id as i64).collect(),
                )
                .context("Failed to create input_ids array")?;
                let mask = Array2::<i64>::ones((1, len));
                session
                    .run(ort::inputs![
                        "input_ids" => Value::from_array(ids).context("Failed to create input_ids tensor")?,
                        "attention_mask" => Value::from_array(mask).context("Failed to create attention mask tensor")?
                    ])
                    .context("Encoder inference failed")?
            }
        };

        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract encoder hidden states")?
            .to_owned();
        Ok(hidden)
    }

    fn step(&self, hidden: &ArrayD<f32>, encoder_len: usize, tokens: &[u32]) -> Result<Vec<f32>> {
        let mut session = self
            .decoder
            .lock()
            .map_err(|_| anyhow::anyhow!("Decoder session lock poisoned"))?;

        let ids = Array2::from_shape_vec(
            (1, tokens.len()),
            tokens.iter().map(|&t| t as i64).collect(),
        )
        .context("Failed to create decoder input_ids array")?;
        let ids = Value::from_array(ids).context("Failed to create decoder input_ids tensor")?;
        let states = Value::from_array(hidden.clone())
            .context("Failed to create encoder hidden states tensor")?;

        let outputs = if self.decoder_wants_mask {
            let mask = Value::from_array(Array2::<i64>::ones((1, encoder_len)))
                .context("Failed to create encoder attention mask tensor")?;
            session.run(ort::inputs![
                "input_ids" => ids,
                "encoder_hidden_states" => states,
                "encoder_attention_mask" => mask
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids,
                "encoder_hidden_states" => states
            ])
        }
        .context("Decoder inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract decoder logits")?;
        let shape = logits.shape().to_vec();
        if shape.len() != 3 {
            anyhow::bail!("Unexpected decoder output shape: {:?}", shape);
        }

        let last = shape[1] - 1;
        Ok((0..shape[2])
            .map(|v| logits[IxDyn(&[0, last, v])])
            .collect())
    }
}

/// Highest logit outside `excluded`, with its softmax probability
pub fn argmax_excluding(logits: &[f32], excluded: &[u32]) -> Option<(u32, f32)> {
    let (best, best_logit) = logits
        .iter()
        .enumerate()
        .filter(|(idx, _)| !excluded.contains(&(*idx as u32)))
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, v)| (idx as u32, *v))?;

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let denom: f32 = logits.iter().map(|l| (l - max).exp()).sum();
    Some((best, (best_logit - max).exp() / denom))
}
