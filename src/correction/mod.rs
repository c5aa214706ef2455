// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Post-OCR lexical correction
//!
//! Tokens far from every vocabulary word get edit-distance candidates,
//! which a masked language model re-ranks in sentence context.

pub mod candidates;
pub mod corrector;
pub mod scorer;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use candidates::{CandidateGenerator, CorrectionCandidate};
pub use corrector::{LexicalCorrector, TranscriptToken};
pub use scorer::OnnxMaskedScorer;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Run correction when the request does not say
    pub enabled: bool,
    /// Shorter tokens are never touched
    pub min_word_len: usize,
    /// Tokens this close to a vocabulary word are kept
    pub edit_distance_threshold: usize,
    pub max_candidates: usize,
    /// Candidates differ in length from the token by at most this much
    pub length_window: usize,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_word_len: 2,
            edit_distance_threshold: 2,
            max_candidates: 10,
            length_window: 6,
        }
    }
}

/// Scores candidates for a masked position
#[cfg_attr(test, mockall::automock)]
pub trait MaskedScorer: Send + Sync {
    /// One score per candidate for the word at `position` of `words`,
    /// higher is better
    fn score(&self, words: &[String], position: usize, candidates: &[String]) -> Result<Vec<f32>>;
}
