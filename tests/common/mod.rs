// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hand-written collaborators shared by the integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ocr_translate_node::translation::{
    LanguagePair, ModelLoadError, TranslationModel, TranslationModelProvider,
};
use ocr_translate_node::vision::ocr::{
    LineRecognizer, PageReader, Recognition, RecognizerSet, TextDetector,
};
use ocr_translate_node::vision::VisionModelManager;
use ocr_translate_node::{Crop, Detection};

/// Returns the same detections for every image
pub struct FixedDetector(pub Vec<Detection>);

impl TextDetector for FixedDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>> {
        Ok(self.0.clone())
    }
}

pub struct FailingDetector;

impl TextDetector for FailingDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>> {
        Err(anyhow!("detector input shape mismatch"))
    }
}

/// Returns the same text for every crop and counts calls
pub struct FixedRecognizer {
    pub text: String,
    pub confidence: f32,
    pub input_size: Option<(u32, u32)>,
    pub calls: AtomicUsize,
}

impl FixedRecognizer {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            input_size: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LineRecognizer for FixedRecognizer {
    fn recognize(&self, _crop: &Crop) -> Result<Recognition> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Recognition::new(self.text.clone(), self.confidence))
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        self.input_size
    }
}

/// Reads crops in order from a script, failing on `None`
pub struct ScriptedRecognizer {
    script: Mutex<Vec<Option<Recognition>>>,
}

impl ScriptedRecognizer {
    pub fn new(script: Vec<Option<Recognition>>) -> Self {
        let mut script = script;
        script.reverse();
        Self {
            script: Mutex::new(script),
        }
    }
}

impl LineRecognizer for ScriptedRecognizer {
    fn recognize(&self, _crop: &Crop) -> Result<Recognition> {
        let next = self
            .script
            .lock()
            .map_err(|_| anyhow!("script lock poisoned"))?
            .pop()
            .flatten();
        next.ok_or_else(|| anyhow!("recognizer failed on this crop"))
    }
}

/// Secondary reader with canned output
pub struct FixedReader(pub Vec<Detection>);

impl PageReader for FixedReader {
    fn read(&self, _image: &DynamicImage) -> Result<Vec<Detection>> {
        Ok(self.0.clone())
    }
}

pub fn blank_page(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    ocr_translate_node::vision::image_utils::encode_png(&blank_page(width, height))
        .expect("encode test page")
}

/// One printed line "HELLO WORLD" at known coordinates
pub fn hello_world_models(confidence: f32) -> VisionModelManager {
    VisionModelManager::from_parts(
        Some(Arc::new(FixedDetector(vec![
            Detection::rect(40.0, 60.0, 160.0, 100.0).with_confidence(0.9),
            Detection::rect(175.0, 62.0, 320.0, 102.0).with_confidence(0.9),
        ]))),
        RecognizerSet::new("en").with("en", Arc::new(FixedRecognizer::new("HELLO WORLD", confidence))),
        Some(Arc::new(FixedRecognizer::new("hello world", 0.5))),
        None,
    )
}

/// Appends `[src>tgt]` so the route taken shows in the output
pub struct Tagger(pub LanguagePair);

impl TranslationModel for Tagger {
    fn translate(&self, text: &str) -> Result<String> {
        Ok(format!("{}[{}>{}]", text, self.0.source, self.0.target))
    }
}

/// Provider over a fixed set of pairs, counting loads per pair
#[derive(Default)]
pub struct FakeProvider {
    pub available: Vec<(&'static str, &'static str)>,
    pub loads: Mutex<HashMap<LanguagePair, usize>>,
}

impl FakeProvider {
    pub fn with(available: &[(&'static str, &'static str)]) -> Self {
        Self {
            available: available.to_vec(),
            ..Default::default()
        }
    }

    pub fn loads_of(&self, source: &str, target: &str) -> usize {
        self.loads
            .lock()
            .expect("loads lock")
            .get(&LanguagePair::new(source, target))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.lock().expect("loads lock").values().sum()
    }
}

impl TranslationModelProvider for FakeProvider {
    fn load(&self, pair: &LanguagePair) -> Result<Arc<dyn TranslationModel>, ModelLoadError> {
        *self
            .loads
            .lock()
            .expect("loads lock")
            .entry(pair.clone())
            .or_default() += 1;
        let key = (pair.source.as_str(), pair.target.as_str());
        if self.available.iter().any(|p| *p == key) {
            Ok(Arc::new(Tagger(pair.clone())))
        } else {
            Err(ModelLoadError::NotFound(pair.clone()))
        }
    }
}
