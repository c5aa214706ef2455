// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CTC printed-text recognizer
//!
//! One instance per language: the model and its character dictionary
//! decide which scripts it can read.

use anyhow::{Context, Result};
use ndarray::ArrayView2;
use ort::session::Session;
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::preprocess_for_recognition;
use super::{LineRecognizer, Recognition};
use crate::inference::{build_cpu_session, input_names, require_file};
use crate::vision::crop::Crop;

/// CTC blank is always class 0
const BLANK: usize = 0;

#[derive(Clone)]
pub struct CtcRecognizer {
    session: Arc<Mutex<Session>>,
    /// Index 0 is the blank; the last entry is a space
    dictionary: Arc<Vec<String>>,
    input_name: String,
}

impl std::fmt::Debug for CtcRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtcRecognizer")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl CtcRecognizer {
    /// Load a recognition model and its one-character-per-line dictionary
    pub fn new(model_path: &Path, dict_path: &Path) -> Result<Self> {
        require_file(dict_path, "OCR character dictionary")?;
        info!("Loading text recognizer from {}", model_path.display());

        let dictionary = load_dictionary(dict_path)?;
        let session = build_cpu_session(model_path, "OCR recognition model")?;
        let input_name = input_names(&session)
            .into_iter()
            .next()
            .unwrap_or_else(|| "x".to_string());

        info!(
            "✅ Text recognizer loaded ({} classes)",
            dictionary.len()
        );
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
        })
    }

    pub fn dictionary_size(&self) -> usize {
        self.dictionary.len()
    }
}

impl LineRecognizer for CtcRecognizer {
    fn recognize(&self, crop: &Crop) -> Result<Recognition> {
        let tensor = preprocess_for_recognition(&crop.image);
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Recognizer session lock poisoned"))?;

        let input = Value::from_array(tensor).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .context("Recognition inference failed")?;
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let shape = output.shape().to_vec();
        let (steps, classes) = match shape.as_slice() {
            [1, t, c] | [t, c] => (*t, *c),
            other => anyhow::bail!("Unexpected recognition output shape: {:?}", other),
        };
        let probs = output
            .to_shape((steps, classes))
            .context("Failed to reshape recognition output")?;

        let recognition = ctc_greedy_decode(probs.view(), &self.dictionary);
        debug!(
            "Recognized '{}' (confidence {:.3})",
            recognition.text, recognition.confidence
        );
        Ok(recognition)
    }
}

/// Blank at index 0, dictionary entries, then a space
pub fn load_dictionary(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).context(format!("Failed to open dictionary: {}", path.display()))?;

    let mut dictionary = vec![String::new()];
    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read dictionary line")?;
        let entry = line.trim_end_matches(['\r', '\n']);
        if !entry.is_empty() {
            dictionary.push(entry.to_string());
        }
    }
    dictionary.push(" ".to_string());
    Ok(dictionary)
}

/// Best-path decoding: collapse repeats, drop blanks
///
/// Rows are per-timestep class scores. Rows that are not already a
/// probability distribution are softmaxed first. Confidence is the mean
/// probability of the emitted characters.
pub fn ctc_greedy_decode(probs: ArrayView2<f32>, dictionary: &[String]) -> Recognition {
    let mut text = String::new();
    let mut scores = Vec::new();
    let mut prev = BLANK;

    for row in probs.rows() {
        let sum: f32 = row.iter().sum();
        let is_distribution = (sum - 1.0).abs() < 1e-2 && row.iter().all(|v| *v >= 0.0);

        let (best, best_score) = row
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, v)| (i, *v))
            .unwrap_or((BLANK, 0.0));

        let probability = if is_distribution {
            best_score
        } else {
            let denom: f32 = row.iter().map(|v| (v - best_score).exp()).sum();
            1.0 / denom
        };

        if best != BLANK && best != prev {
            if let Some(ch) = dictionary.get(best) {
                text.push_str(ch);
                scores.push(probability);
            }
        }
        prev = best;
    }

    let confidence = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f32>() / scores.len() as f32
    };

    Recognition {
        text: text.trim().to_string(),
        confidence,
    }
}
