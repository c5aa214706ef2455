// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model loading
//!
//! Missing model files must leave the manager usable with the affected
//! services disabled. Tests against real exported models are ignored by
//! default; point `OCR_MODEL_DIR` at a model directory to run them.

use std::path::PathBuf;
use std::sync::Arc;

use ocr_translate_node::config::ModelPaths;
use ocr_translate_node::vision::language::LanguageConfig;
use ocr_translate_node::vision::ocr::RecognizerSet;
use ocr_translate_node::vision::{VisionModelInfo, VisionModelManager};

use crate::common::{FixedDetector, FixedReader, FixedRecognizer};

#[test]
fn test_missing_directories_disable_everything() {
    let root = tempfile::tempdir().unwrap();
    let manager = VisionModelManager::load(&ModelPaths::under(root.path()), &LanguageConfig::default());

    assert!(!manager.has_ocr());
    assert!(!manager.has_handwriting());
    assert!(manager.page_reader().is_none());
    assert!(manager.recognizers().is_empty());
}

#[test]
fn test_unconfigured_paths() {
    let paths = ModelPaths {
        ocr_model_dir: None,
        handwriting_model_dir: None,
        mlm_model_dir: None,
        vocabulary_path: None,
        translation_model_dir: None,
    };
    let manager = VisionModelManager::load(&paths, &LanguageConfig::default());
    assert!(!manager.has_ocr());
}

#[test]
fn test_corrupt_detector_file_is_not_fatal() {
    let root = tempfile::tempdir().unwrap();
    let ocr_dir = root.path().join("ocr-onnx");
    std::fs::create_dir_all(&ocr_dir).unwrap();
    std::fs::write(ocr_dir.join("det_model.onnx"), b"not an onnx graph").unwrap();

    let manager = VisionModelManager::load(&ModelPaths::under(root.path()), &LanguageConfig::default());
    assert!(manager.detector().is_none());
}

#[test]
fn test_list_models_reports_availability() {
    let manager = VisionModelManager::from_parts(
        Some(Arc::new(FixedDetector(Vec::new()))),
        RecognizerSet::new("en")
            .with("en", Arc::new(FixedRecognizer::new("x", 0.9)))
            .with("fr", Arc::new(FixedRecognizer::new("x", 0.9))),
        None,
        Some(Arc::new(FixedReader(Vec::new()))),
    );

    let models = manager.list_models();
    assert!(models.contains(&VisionModelInfo {
        name: "text-detector".to_string(),
        model_type: "detection".to_string(),
        available: true,
    }));
    assert!(models.iter().any(|m| m.name == "recognizer-fr" && m.available));
    assert!(models.iter().any(|m| m.name == "handwriting" && !m.available));
    assert!(manager.has_ocr());
    assert!(!manager.has_handwriting());
}

#[test]
#[ignore] // Requires exported detector/recognizer models
fn test_real_models_load() {
    let dir = std::env::var("OCR_MODEL_DIR").unwrap_or_else(|_| "./models/ocr-onnx".to_string());
    let paths = ModelPaths {
        ocr_model_dir: Some(PathBuf::from(dir)),
        ..ModelPaths::under("./models")
    };
    let manager = VisionModelManager::load(&paths, &LanguageConfig::default());
    assert!(manager.has_ocr());
    assert!(manager.page_reader().is_some());
}
