// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Greedy per-token correction
//!
//! Every position is scored against the uncorrected sentence; replacements
//! go into a separate output, so one correction never changes the context
//! another token is scored in.

use std::sync::Arc;
use tracing::{debug, warn};

use super::candidates::{CandidateGenerator, CorrectionCandidate};
use super::{CorrectionConfig, MaskedScorer};

/// One whitespace-delimited token and the transcript line it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptToken {
    pub text: String,
    pub line: usize,
}

impl TranscriptToken {
    /// Split a transcript into tokens, remembering line indices
    pub fn tokenize(transcript: &str) -> Vec<TranscriptToken> {
        transcript
            .lines()
            .enumerate()
            .flat_map(|(line, text)| {
                text.split_whitespace().map(move |t| TranscriptToken {
                    text: t.to_string(),
                    line,
                })
            })
            .collect()
    }

    /// Rebuild the transcript; lines keep their order, empty lines included
    pub fn join(tokens: &[TranscriptToken], line_count: usize) -> String {
        let mut lines = vec![Vec::new(); line_count];
        for token in tokens {
            if let Some(line) = lines.get_mut(token.line) {
                line.push(token.text.as_str());
            }
        }
        lines
            .iter()
            .map(|words| words.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct LexicalCorrector {
    generator: CandidateGenerator,
    scorer: Option<Arc<dyn MaskedScorer>>,
    config: CorrectionConfig,
}

impl std::fmt::Debug for LexicalCorrector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexicalCorrector")
            .field("vocabulary", &self.generator.len())
            .field("scorer", &self.scorer.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl LexicalCorrector {
    pub fn new(
        generator: CandidateGenerator,
        scorer: Option<Arc<dyn MaskedScorer>>,
        config: CorrectionConfig,
    ) -> Self {
        Self {
            generator,
            scorer,
            config,
        }
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    /// Whether a token may be corrected at all
    pub fn is_eligible(&self, token: &str) -> bool {
        token.chars().count() >= self.config.min_word_len
            && token.chars().all(char::is_alphabetic)
    }

    /// Correct a token sequence; output has the same length
    pub fn correct(&self, tokens: &[String]) -> Vec<String> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, token)| match self.correct_at(tokens, i) {
                Some(replacement) => {
                    debug!("Corrected '{}' -> '{}'", token, replacement);
                    replacement
                }
                None => token.clone(),
            })
            .collect()
    }

    /// Correct a multi-line transcript, keeping its line structure
    pub fn correct_transcript(&self, transcript: &str) -> String {
        let mut tokens = TranscriptToken::tokenize(transcript);
        let words: Vec<String> = tokens.iter().map(|t| t.text.clone()).collect();
        for (token, word) in tokens.iter_mut().zip(self.correct(&words)) {
            token.text = word;
        }
        TranscriptToken::join(&tokens, transcript.lines().count())
    }

    fn correct_at(&self, words: &[String], position: usize) -> Option<String> {
        let token = &words[position];
        if !self.is_eligible(token) {
            return None;
        }

        let mut candidates = self.generator.candidates(token);
        let best = candidates.first()?;
        if best.word.eq_ignore_ascii_case(token)
            || best.distance <= self.config.edit_distance_threshold
        {
            return None;
        }

        let scorer = self.scorer.as_ref()?;
        let names: Vec<String> = candidates.iter().map(|c| c.word.clone()).collect();
        let scores = match scorer.score(words, position, &names) {
            Ok(s) if s.len() == candidates.len() => s,
            Ok(s) => {
                warn!(
                    "Scorer returned {} scores for {} candidates",
                    s.len(),
                    candidates.len()
                );
                return None;
            }
            Err(e) => {
                warn!("Masked scoring failed for '{}': {}", token, e);
                return None;
            }
        };
        for (candidate, score) in candidates.iter_mut().zip(scores) {
            candidate.score = Some(score);
        }

        let winner = top_scored(&candidates)?;
        if !winner.word.chars().all(char::is_alphabetic) {
            return None;
        }
        Some(match_case(token, &winner.word))
    }
}

/// Highest score; the earliest candidate wins ties
fn top_scored(candidates: &[CorrectionCandidate]) -> Option<&CorrectionCandidate> {
    candidates.iter().fold(None, |best, c| match (best, c.score) {
        (None, Some(_)) => Some(c),
        (Some(b), Some(s)) if b.score.map_or(true, |bs| s > bs) => Some(c),
        (best, _) => best,
    })
}

/// Carry the token's capitalization over to the replacement
fn match_case(token: &str, word: &str) -> String {
    if token.chars().count() > 1 && token.chars().all(|c| !c.is_lowercase()) {
        return word.to_uppercase();
    }
    let mut chars = word.chars();
    match (token.chars().next(), chars.next()) {
        (Some(t), Some(first)) if t.is_uppercase() => first.to_uppercase().chain(chars).collect(),
        _ => word.to_string(),
    }
}
