// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Lexical correction, alone and inside an extraction

use anyhow::Result;
use std::sync::Arc;

use ocr_translate_node::correction::{CorrectionConfig, TranscriptToken};
use ocr_translate_node::pipeline::PipelineConfig;
use ocr_translate_node::vision::classifier::{ClassifierConfig, TextTypeHint};
use ocr_translate_node::vision::language::LanguageConfig;
use ocr_translate_node::vision::ocr::RecognizerSet;
use ocr_translate_node::vision::{LanguageGuesser, TextTypeClassifier, VisionModelManager};
use ocr_translate_node::{
    CandidateGenerator, Detection, ExtractOptions, LexicalCorrector, MaskedScorer,
    RecognitionOrchestrator,
};

use crate::common::{blank_page, FixedDetector, FixedRecognizer};

const VOCABULARY: &[&str] = &["the", "ten", "quick", "brown", "fox", "jumps", "over", "lazy", "dog"];

/// Scores one preferred word above everything else
struct Prefers(&'static str);

impl MaskedScorer for Prefers {
    fn score(&self, _words: &[String], _position: usize, candidates: &[String]) -> Result<Vec<f32>> {
        Ok(candidates
            .iter()
            .map(|c| if c == self.0 { 1.0 } else { 0.0 })
            .collect())
    }
}

fn corrector(scorer: Option<Arc<dyn MaskedScorer>>) -> LexicalCorrector {
    let config = CorrectionConfig::default();
    let generator = CandidateGenerator::new(
        VOCABULARY.iter().copied(),
        config.length_window,
        config.max_candidates,
    );
    LexicalCorrector::new(generator, scorer, config)
}

fn words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

#[test]
fn test_near_match_is_kept() {
    let c = corrector(Some(Arc::new(Prefers("the"))));
    assert_eq!(c.correct(&words("teh")), words("teh"));
}

#[test]
fn test_short_and_non_alphabetic_tokens_untouched() {
    let c = corrector(Some(Arc::new(Prefers("dog"))));
    let input = words("a 42 qx7zk d0g");
    assert_eq!(c.correct(&input), input);
}

#[test]
fn test_distant_token_replaced_by_best_scored() {
    let c = corrector(Some(Arc::new(Prefers("quick"))));
    assert_eq!(
        c.correct(&words("the qvxzk brown fox")),
        words("the quick brown fox")
    );
}

#[test]
fn test_no_scorer_keeps_tokens() {
    let c = corrector(None);
    assert_eq!(c.correct(&words("qvxzk")), words("qvxzk"));
}

#[test]
fn test_capitalization_carried_over() {
    let c = corrector(Some(Arc::new(Prefers("quick"))));
    assert_eq!(c.correct(&words("Qvxzk")), words("Quick"));
    assert_eq!(c.correct(&words("QVXZK")), words("QUICK"));
}

#[test]
fn test_transcript_line_structure_preserved() {
    let c = corrector(Some(Arc::new(Prefers("quick"))));
    assert_eq!(
        c.correct_transcript("the qvxzk\nbrown fox"),
        "the quick\nbrown fox"
    );

    let tokens = TranscriptToken::tokenize("one two\nthree");
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[2].line, 1);
}

fn correcting_orchestrator(recognized: &str) -> RecognitionOrchestrator {
    let models = VisionModelManager::from_parts(
        Some(Arc::new(FixedDetector(vec![Detection::rect(40.0, 40.0, 300.0, 80.0)]))),
        RecognizerSet::new("en")
            .with("en", Arc::new(FixedRecognizer::new(recognized, 0.9)))
            .with("fr", Arc::new(FixedRecognizer::new(recognized, 0.9))),
        None,
        None,
    );
    RecognitionOrchestrator::new(
        models,
        TextTypeClassifier::new(ClassifierConfig::default()),
        LanguageGuesser::new(LanguageConfig::default()),
        PipelineConfig::default(),
    )
    .with_corrector(Arc::new(corrector(Some(Arc::new(Prefers("quick"))))))
}

fn options(language: &str, correction: Option<bool>) -> ExtractOptions {
    ExtractOptions {
        text_type: TextTypeHint::Printed,
        input_language: Some(language.to_string()),
        correction,
        ..Default::default()
    }
}

#[test]
fn test_extraction_corrected_on_request() {
    let out = correcting_orchestrator("the qvxzk brown fox")
        .extract(&blank_page(400, 200), &options("en", Some(true)));
    assert_eq!(out.text, "the quick brown fox");
    assert!(out.corrected);
}

#[test]
fn test_extraction_follows_disabled_default() {
    let out = correcting_orchestrator("the qvxzk brown fox")
        .extract(&blank_page(400, 200), &options("en", None));
    assert_eq!(out.text, "the qvxzk brown fox");
    assert!(!out.corrected);
}

#[test]
fn test_non_english_never_corrected() {
    let out = correcting_orchestrator("le qvxzk renard")
        .extract(&blank_page(400, 200), &options("fr", Some(true)));
    assert_eq!(out.text, "le qvxzk renard");
    assert!(!out.corrected);
}
