// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Edit-distance candidate generation

use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::info;

/// A vocabulary word proposed for one token
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionCandidate {
    pub word: String,
    /// Case-insensitive Levenshtein distance to the token
    pub distance: usize,
    /// Masked-infill score, once ranked
    pub score: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    /// Words as written in the vocabulary
    vocabulary: BTreeSet<String>,
    /// Lowercased keys for membership tests
    lowercase: HashSet<String>,
    length_window: usize,
    max_candidates: usize,
}

impl CandidateGenerator {
    pub fn new<I, S>(words: I, length_window: usize, max_candidates: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        let lowercase = vocabulary.iter().map(|w| w.to_lowercase()).collect();
        Self {
            vocabulary,
            lowercase,
            length_window,
            max_candidates,
        }
    }

    /// One word per line
    pub fn from_file(path: &Path, length_window: usize, max_candidates: usize) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read vocabulary: {}", path.display()))?;
        let generator = Self::new(content.lines(), length_window, max_candidates);
        info!(
            "Loaded vocabulary of {} words from {}",
            generator.len(),
            path.display()
        );
        Ok(generator)
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.lowercase.contains(&word.to_lowercase())
    }

    /// Words within the length window, nearest first, capped
    ///
    /// Distance ignores case; candidates keep their vocabulary spelling.
    /// Equal distances keep vocabulary order.
    pub fn candidates(&self, token: &str) -> Vec<CorrectionCandidate> {
        let lower = token.to_lowercase();
        let len = lower.chars().count();

        let mut found: Vec<CorrectionCandidate> = self
            .vocabulary
            .iter()
            .filter(|w| w.chars().count().abs_diff(len) <= self.length_window)
            .map(|w| CorrectionCandidate {
                word: w.clone(),
                distance: strsim::levenshtein(&lower, &w.to_lowercase()),
                score: None,
            })
            .collect();

        found.sort_by_key(|c| c.distance);
        found.truncate(self.max_candidates);
        found
    }
}
