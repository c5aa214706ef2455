// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end extraction over fake collaborators

use std::sync::Arc;

use ocr_translate_node::pipeline::{ExtractError, ExtractionSource, PipelineConfig};
use ocr_translate_node::vision::classifier::{ClassifierConfig, TextTypeHint};
use ocr_translate_node::vision::language::LanguageConfig;
use ocr_translate_node::vision::ocr::{Recognition, RecognizerSet};
use ocr_translate_node::vision::{
    LanguageGuesser, LineSeparation, TextTypeClassifier, VisionModelManager,
};
use ocr_translate_node::{Detection, ExtractOptions, RecognitionOrchestrator, TextType};

use crate::common::{
    blank_page, hello_world_models, png_bytes, FailingDetector, FixedDetector, FixedReader,
    FixedRecognizer, ScriptedRecognizer,
};

fn orchestrator(models: VisionModelManager) -> RecognitionOrchestrator {
    RecognitionOrchestrator::new(
        models,
        TextTypeClassifier::new(ClassifierConfig::default()),
        LanguageGuesser::new(LanguageConfig::default()),
        PipelineConfig::default(),
    )
}

#[test]
fn test_hello_world_printed_english() {
    let out = orchestrator(hello_world_models(0.96))
        .extract(&blank_page(400, 300), &ExtractOptions::default());

    assert_eq!(out.text, "HELLO WORLD");
    assert_eq!(out.text_type, TextType::Printed);
    assert_eq!(out.detected_language, "en");
}

#[test]
fn test_upload_path_matches_decoded_path() {
    let orchestrator = orchestrator(hello_world_models(0.96));
    let out = orchestrator
        .extract_upload(&png_bytes(400, 300), 10 * 1024 * 1024, &ExtractOptions::default())
        .unwrap();
    assert_eq!(out.text, "HELLO WORLD");
    assert_eq!(out.source, ExtractionSource::Printed);
}

#[test]
fn test_upload_rejects_garbage() {
    let orchestrator = orchestrator(hello_world_models(0.96));
    let err = orchestrator
        .extract_upload(b"definitely not an image", 1024, &ExtractOptions::default())
        .unwrap_err();
    assert!(matches!(err, ExtractError::Image(_)));
}

#[test]
fn test_upload_rejects_oversized() {
    let orchestrator = orchestrator(hello_world_models(0.96));
    let bytes = png_bytes(400, 300);
    let err = orchestrator
        .extract_upload(&bytes, bytes.len() - 1, &ExtractOptions::default())
        .unwrap_err();
    assert!(matches!(err, ExtractError::Image(_)));
}

#[test]
fn test_lines_merged_top_to_bottom() {
    let printed = ScriptedRecognizer::new(vec![
        Some(Recognition::new("first line", 0.9)),
        Some(Recognition::new("second line", 0.92)),
    ]);
    let models = VisionModelManager::from_parts(
        Some(Arc::new(FixedDetector(vec![
            Detection::rect(40.0, 200.0, 300.0, 240.0),
            Detection::rect(40.0, 40.0, 300.0, 80.0),
        ]))),
        RecognizerSet::new("en").with("en", Arc::new(printed)),
        None,
        None,
    );
    let options = ExtractOptions {
        input_language: Some("en".to_string()),
        ..Default::default()
    };
    let out = orchestrator(models).extract(&blank_page(400, 300), &options);
    assert_eq!(out.text, "first line\nsecond line");
    assert_eq!(out.line_count, 2);
}

#[test]
fn test_failing_crop_degrades_to_empty_line() {
    let printed = ScriptedRecognizer::new(vec![None, Some(Recognition::new("survivor", 0.9))]);
    let models = VisionModelManager::from_parts(
        Some(Arc::new(FixedDetector(vec![
            Detection::rect(40.0, 40.0, 300.0, 80.0),
            Detection::rect(40.0, 200.0, 300.0, 240.0),
        ]))),
        RecognizerSet::new("en").with("en", Arc::new(printed)),
        None,
        None,
    );
    let options = ExtractOptions {
        input_language: Some("en".to_string()),
        text_type: TextTypeHint::Printed,
        ..Default::default()
    };
    let out = orchestrator(models).extract(&blank_page(400, 300), &options);
    assert_eq!(out.text, "survivor");
}

#[test]
fn test_detector_failure_falls_back_to_reader() {
    let models = VisionModelManager::from_parts(
        Some(Arc::new(FailingDetector)),
        RecognizerSet::new("en").with("en", Arc::new(FixedRecognizer::new("unused", 0.9))),
        None,
        Some(Arc::new(FixedReader(vec![
            Detection::rect(120.0, 20.0, 200.0, 40.0).with_text("READER"),
            Detection::rect(20.0, 22.0, 100.0, 42.0).with_text("SECONDARY"),
        ]))),
    );
    let out = orchestrator(models).extract(&blank_page(400, 300), &ExtractOptions::default());
    assert_eq!(out.text, "SECONDARY READER");
    assert_eq!(out.source, ExtractionSource::Fallback);
    assert_eq!(out.text_type, TextType::Printed);
}

#[test]
fn test_nothing_detected_and_nothing_loaded_is_empty() {
    let models = VisionModelManager::from_parts(
        Some(Arc::new(FixedDetector(Vec::new()))),
        RecognizerSet::new("en"),
        None,
        None,
    );
    let out = orchestrator(models).extract(&blank_page(400, 300), &ExtractOptions::default());
    assert_eq!(out.text, "");
}

#[test]
fn test_nothing_detected_reads_whole_image_printed() {
    let printed = Arc::new(FixedRecognizer::new("HELLO WORLD", 0.95));
    let models = VisionModelManager::from_parts(
        Some(Arc::new(FixedDetector(Vec::new()))),
        RecognizerSet::new("en").with("en", printed.clone()),
        None,
        None,
    );
    for text_type in [TextTypeHint::Printed, TextTypeHint::Auto] {
        let options = ExtractOptions {
            text_type,
            ..Default::default()
        };
        let out = orchestrator(models.clone()).extract(&blank_page(400, 300), &options);
        assert_eq!(out.text, "HELLO WORLD");
        assert_eq!(out.text_type, TextType::Printed);
        assert_eq!(out.source, ExtractionSource::Printed);
        assert_eq!(out.detected_language, "en");
        assert_eq!(out.line_count, 1);
    }
    assert_eq!(printed.calls(), 2);
}

#[test]
fn test_empty_reader_output_falls_through_to_whole_image() {
    let models = VisionModelManager::from_parts(
        Some(Arc::new(FixedDetector(Vec::new()))),
        RecognizerSet::new("en").with("en", Arc::new(FixedRecognizer::new("WHOLE PAGE", 0.9))),
        None,
        Some(Arc::new(FixedReader(Vec::new()))),
    );
    let out = orchestrator(models).extract(&blank_page(400, 300), &ExtractOptions::default());
    assert_eq!(out.text, "WHOLE PAGE");
    assert_eq!(out.source, ExtractionSource::Printed);
}

#[test]
fn test_reader_output_preferred_over_whole_image() {
    let printed = Arc::new(FixedRecognizer::new("WHOLE PAGE", 0.9));
    let models = VisionModelManager::from_parts(
        Some(Arc::new(FixedDetector(Vec::new()))),
        RecognizerSet::new("en").with("en", printed.clone()),
        None,
        Some(Arc::new(FixedReader(vec![
            Detection::rect(20.0, 20.0, 120.0, 40.0).with_text("READER LINE"),
        ]))),
    );
    let out = orchestrator(models).extract(&blank_page(400, 300), &ExtractOptions::default());
    assert_eq!(out.text, "READER LINE");
    assert_eq!(out.source, ExtractionSource::Fallback);
    assert_eq!(printed.calls(), 0);
}

#[test]
fn test_no_line_separation_reads_one_crop() {
    let printed = Arc::new(FixedRecognizer::new("all of it", 0.9));
    let models = VisionModelManager::from_parts(
        Some(Arc::new(FixedDetector(vec![
            Detection::rect(40.0, 40.0, 300.0, 80.0),
            Detection::rect(40.0, 200.0, 300.0, 240.0),
        ]))),
        RecognizerSet::new("en").with("en", printed.clone()),
        None,
        None,
    );
    let options = ExtractOptions {
        input_language: Some("en".to_string()),
        text_type: TextTypeHint::Printed,
        line_separation: LineSeparation::No,
        ..Default::default()
    };
    let out = orchestrator(models).extract(&blank_page(400, 300), &options);
    assert_eq!(out.text, "all of it");
    assert_eq!(out.line_count, 1);
    assert_eq!(printed.calls(), 1);
}

#[test]
fn test_unavailable_without_models() {
    let models = VisionModelManager::from_parts(None, RecognizerSet::new("en"), None, None);
    let err = orchestrator(models)
        .extract_upload(&png_bytes(50, 50), 1024 * 1024, &ExtractOptions::default())
        .unwrap_err();
    assert!(matches!(err, ExtractError::Unavailable));
}
