// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager for loading the detector and recognizers

use std::path::Path;
use std::sync::Arc;

use crate::config::ModelPaths;
use crate::vision::language::{LanguageCodes, LanguageConfig};
use crate::vision::ocr::{
    CtcRecognizer, DetectRecognizeReader, HandwritingRecognizer, LineRecognizer,
    OnnxTextDetector, PageReader, RecognizerSet, TextDetector,
};

/// Detection threshold used by the secondary page reader
///
/// Lower than the primary so faint text missed on the first pass is
/// still picked up.
pub const FALLBACK_PROB_THRESHOLD: f32 = 0.2;

/// Information about a loaded vision model
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VisionModelInfo {
    /// Model name
    pub name: String,
    /// Model type (detection, recognition, handwriting, reader)
    pub model_type: String,
    /// Whether the model is available
    pub available: bool,
}

/// Owns every vision model handle
///
/// Models are loaded once at startup; missing files are logged and leave
/// the corresponding slot empty.
#[derive(Clone)]
pub struct VisionModelManager {
    detector: Option<Arc<dyn TextDetector>>,
    recognizers: RecognizerSet,
    handwriting: Option<Arc<dyn LineRecognizer>>,
    page_reader: Option<Arc<dyn PageReader>>,
}

impl std::fmt::Debug for VisionModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionModelManager")
            .field("detector", &self.detector.is_some())
            .field("recognizers", &self.recognizers)
            .field("handwriting", &self.handwriting.is_some())
            .field("page_reader", &self.page_reader.is_some())
            .finish()
    }
}

impl VisionModelManager {
    /// Load whatever models exist under `paths`
    pub fn load(paths: &ModelPaths, languages: &LanguageConfig) -> Self {
        let mut recognizers = RecognizerSet::new(&languages.fallback);
        let mut detector: Option<OnnxTextDetector> = None;

        if let Some(dir) = paths.ocr_model_dir.as_deref() {
            match OnnxTextDetector::new(&dir.join("det_model.onnx")) {
                Ok(d) => {
                    tracing::info!("✅ Text detector loaded from {}", dir.display());
                    detector = Some(d);
                }
                Err(e) => tracing::warn!("⚠️ Failed to load text detector: {}", e),
            }
            load_recognizers(dir, &languages.supported, &mut recognizers);
        }

        let handwriting = paths.handwriting_model_dir.as_deref().and_then(|dir| {
            match HandwritingRecognizer::new(dir) {
                Ok(model) => {
                    tracing::info!("✅ Handwriting model loaded from {}", dir.display());
                    Some(Arc::new(model) as Arc<dyn LineRecognizer>)
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to load handwriting model: {}", e);
                    None
                }
            }
        });

        let page_reader = match (&detector, recognizers.get(&languages.fallback)) {
            (Some(d), Some(r)) => {
                let sensitive = d.clone().with_prob_threshold(FALLBACK_PROB_THRESHOLD);
                Some(Arc::new(DetectRecognizeReader::new(Arc::new(sensitive), r.clone()))
                    as Arc<dyn PageReader>)
            }
            _ => None,
        };

        Self {
            detector: detector.map(|d| Arc::new(d) as Arc<dyn TextDetector>),
            recognizers,
            handwriting,
            page_reader,
        }
    }

    /// Assemble from already-built collaborators
    pub fn from_parts(
        detector: Option<Arc<dyn TextDetector>>,
        recognizers: RecognizerSet,
        handwriting: Option<Arc<dyn LineRecognizer>>,
        page_reader: Option<Arc<dyn PageReader>>,
    ) -> Self {
        Self {
            detector,
            recognizers,
            handwriting,
            page_reader,
        }
    }

    pub fn detector(&self) -> Option<&Arc<dyn TextDetector>> {
        self.detector.as_ref()
    }

    pub fn recognizers(&self) -> &RecognizerSet {
        &self.recognizers
    }

    pub fn handwriting(&self) -> Option<&Arc<dyn LineRecognizer>> {
        self.handwriting.as_ref()
    }

    pub fn page_reader(&self) -> Option<&Arc<dyn PageReader>> {
        self.page_reader.as_ref()
    }

    /// Check if printed OCR is available
    pub fn has_ocr(&self) -> bool {
        self.detector.is_some() && !self.recognizers.is_empty()
    }

    pub fn has_handwriting(&self) -> bool {
        self.handwriting.is_some()
    }

    /// List all vision models and whether they loaded
    pub fn list_models(&self) -> Vec<VisionModelInfo> {
        let mut models = vec![VisionModelInfo {
            name: "text-detector".to_string(),
            model_type: "detection".to_string(),
            available: self.detector.is_some(),
        }];

        for language in self.recognizers.languages() {
            models.push(VisionModelInfo {
                name: format!("recognizer-{}", language),
                model_type: "recognition".to_string(),
                available: true,
            });
        }

        models.push(VisionModelInfo {
            name: "handwriting".to_string(),
            model_type: "handwriting".to_string(),
            available: self.handwriting.is_some(),
        });
        models.push(VisionModelInfo {
            name: "page-reader".to_string(),
            model_type: "reader".to_string(),
            available: self.page_reader.is_some(),
        });

        models
    }
}

/// `rec_model_{lang}.onnx` + `keys_{lang}.txt` per language, then an
/// unsuffixed `rec_model.onnx` + `keys.txt` as English if none matched it
fn load_recognizers(dir: &Path, languages: &[String], set: &mut RecognizerSet) {
    for language in languages {
        let code = LanguageCodes::to_ocr(language);
        let model = dir.join(format!("rec_model_{}.onnx", code));
        let keys = dir.join(format!("keys_{}.txt", code));
        if !model.exists() {
            tracing::debug!("No recognizer for {} at {}", code, model.display());
            continue;
        }
        match CtcRecognizer::new(&model, &keys) {
            Ok(r) => {
                tracing::info!("✅ Recognizer loaded for {}", code);
                set.insert(&code, Arc::new(r));
            }
            Err(e) => tracing::warn!("⚠️ Failed to load recognizer for {}: {}", code, e),
        }
    }

    if set.exact("en").is_none() {
        let model = dir.join("rec_model.onnx");
        if model.exists() {
            match CtcRecognizer::new(&model, &dir.join("keys.txt")) {
                Ok(r) => {
                    tracing::info!("✅ Default recognizer loaded as en");
                    set.insert("en", Arc::new(r));
                }
                Err(e) => tracing::warn!("⚠️ Failed to load default recognizer: {}", e),
            }
        }
    }
}
