// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text detection and recognition
//!
//! The pipeline only sees the traits defined here. ONNX-backed
//! implementations live in the submodules:
//! - `detection` - DB-style probability-map detector
//! - `recognition` - CTC printed-text recognizer (one per language)
//! - `handwriting` - vision encoder-decoder handwriting recognizer
//! - `reader` - detector + recognizer combined into a page reader
//! - `preprocessing` - tensor preparation for all of the above

pub mod detection;
pub mod handwriting;
pub mod preprocessing;
pub mod reader;
pub mod recognition;

use anyhow::Result;
use image::DynamicImage;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::crop::Crop;
use super::geometry::Detection;
use super::language::LanguageCodes;

pub use detection::OnnxTextDetector;
pub use handwriting::HandwritingRecognizer;
pub use reader::DetectRecognizeReader;
pub use recognition::CtcRecognizer;

/// Text and confidence for one crop
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recognition {
    pub text: String,
    /// 0.0-1.0
    pub confidence: f32,
}

impl Recognition {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Locates text regions
#[cfg_attr(test, mockall::automock)]
pub trait TextDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>>;
}

/// Reads the text of one line crop
#[cfg_attr(test, mockall::automock)]
pub trait LineRecognizer: Send + Sync {
    fn recognize(&self, crop: &Crop) -> Result<Recognition>;

    /// Fixed input size the crop should be resized to, if any
    fn input_size(&self) -> Option<(u32, u32)> {
        None
    }
}

/// Detects and recognizes in one pass; detections carry text
pub trait PageReader: Send + Sync {
    fn read(&self, image: &DynamicImage) -> Result<Vec<Detection>>;
}

/// Printed-text recognizers keyed by OCR language code
#[derive(Clone)]
pub struct RecognizerSet {
    by_language: BTreeMap<String, Arc<dyn LineRecognizer>>,
    default_language: String,
}

impl std::fmt::Debug for RecognizerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerSet")
            .field("languages", &self.by_language.keys().collect::<Vec<_>>())
            .field("default_language", &self.default_language)
            .finish()
    }
}

impl RecognizerSet {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self {
            by_language: BTreeMap::new(),
            default_language: LanguageCodes::to_ocr(&default_language.into()),
        }
    }

    pub fn insert(&mut self, language: &str, recognizer: Arc<dyn LineRecognizer>) {
        self.by_language
            .insert(LanguageCodes::to_ocr(language), recognizer);
    }

    pub fn with(mut self, language: &str, recognizer: Arc<dyn LineRecognizer>) -> Self {
        self.insert(language, recognizer);
        self
    }

    /// Recognizer registered for exactly this language
    pub fn exact(&self, language: &str) -> Option<&Arc<dyn LineRecognizer>> {
        self.by_language.get(&LanguageCodes::to_ocr(language))
    }

    /// Recognizer for `language`, else the default language's, else any
    pub fn get(&self, language: &str) -> Option<&Arc<dyn LineRecognizer>> {
        self.exact(language)
            .or_else(|| self.by_language.get(&self.default_language))
            .or_else(|| self.by_language.values().next())
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.by_language.keys().map(String::as_str)
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn is_empty(&self) -> bool {
        self.by_language.is_empty()
    }
}
