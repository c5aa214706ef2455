// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Recognition orchestrator
//!
//! Turns one decoded image into a document transcript. Every per-item
//! failure (detector call, one crop, the fallback reader) degrades to "no
//! output" for that item and is logged; only a missing model set stops an
//! extraction.

use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::scratch::ScratchDir;
use super::{ExtractError, ExtractOptions, Extraction, ExtractionSource, PipelineConfig};
use crate::correction::LexicalCorrector;
use crate::vision::classifier::{
    classify_by_confidence, TextType, TextTypeClassifier, TextTypeHint, TextTypeStrategy,
};
use crate::vision::crop::{crop, Crop};
use crate::vision::geometry::to_boxes;
use crate::vision::image_utils::{decode_image_bytes, format_to_extension};
use crate::vision::language::{LanguageCodes, LanguageGuesser, LanguageStrategy};
use crate::vision::lines::{arrange, group_lines};
use crate::vision::model_manager::VisionModelManager;
use crate::vision::ocr::LineRecognizer;

/// Output of one recognizer over all crops
#[derive(Debug, Clone, Default)]
struct Transcript {
    lines: Vec<String>,
    /// Mean confidence over lines that produced text
    mean_confidence: Option<f32>,
}

impl Transcript {
    fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// Routes crops to the printed or handwriting recognizer and merges output
pub struct RecognitionOrchestrator {
    models: VisionModelManager,
    classifier: TextTypeClassifier,
    language: LanguageGuesser,
    corrector: Option<Arc<LexicalCorrector>>,
    config: PipelineConfig,
}

impl RecognitionOrchestrator {
    pub fn new(
        models: VisionModelManager,
        classifier: TextTypeClassifier,
        language: LanguageGuesser,
        config: PipelineConfig,
    ) -> Self {
        Self {
            models,
            classifier,
            language,
            corrector: None,
            config,
        }
    }

    pub fn with_corrector(mut self, corrector: Arc<LexicalCorrector>) -> Self {
        self.corrector = Some(corrector);
        self
    }

    pub fn models(&self) -> &VisionModelManager {
        &self.models
    }

    pub fn language_guesser(&self) -> &LanguageGuesser {
        &self.language
    }

    pub fn has_corrector(&self) -> bool {
        self.corrector.is_some()
    }

    /// Whether any recognition path is available
    pub fn is_ready(&self) -> bool {
        self.models.has_ocr()
            || self.models.has_handwriting()
            || self.models.page_reader().is_some()
    }

    /// Decode an upload inside a scratch directory and extract its text
    ///
    /// The scratch directory (upload plus optional crops) is removed before
    /// this returns.
    pub fn extract_upload(
        &self,
        bytes: &[u8],
        max_bytes: usize,
        options: &ExtractOptions,
    ) -> Result<Extraction, ExtractError> {
        if !self.is_ready() {
            return Err(ExtractError::Unavailable);
        }

        let (image, info) = decode_image_bytes(bytes, max_bytes)?;
        debug!(
            "Decoded upload: {}x{}, {} bytes",
            info.width, info.height, info.size_bytes
        );

        let scratch = ScratchDir::new()?;
        scratch.store_upload(bytes, format_to_extension(info.format))?;
        Ok(self.run(&image, options, Some(&scratch)))
    }

    /// Extract text from an already-decoded image
    pub fn extract(&self, image: &DynamicImage, options: &ExtractOptions) -> Extraction {
        self.run(image, options, None)
    }

    fn run(
        &self,
        image: &DynamicImage,
        options: &ExtractOptions,
        scratch: Option<&ScratchDir>,
    ) -> Extraction {
        let start = Instant::now();
        let crops = self.line_crops(image, options);

        if let Some(scratch) = scratch.filter(|_| self.config.keep_crops) {
            if let Err(e) = scratch.store_crops(&crops) {
                warn!("Failed to keep line crops: {}", e);
            }
        }

        let mut extraction = if crops.is_empty() {
            self.without_crops(image, options)
        } else {
            self.with_crops(image, &crops, options)
        };

        self.apply_correction(&mut extraction, options);

        info!(
            "Extraction complete: {} lines, {} chars, {} / {} via {:?} in {}ms",
            extraction.line_count,
            extraction.text.chars().count(),
            extraction.text_type,
            extraction.detected_language,
            extraction.source,
            start.elapsed().as_millis()
        );
        extraction
    }

    /// Detect, normalize, group and crop
    fn line_crops(&self, image: &DynamicImage, options: &ExtractOptions) -> Vec<Crop> {
        let Some(detector) = self.models.detector() else {
            return Vec::new();
        };

        let detections = detector.detect(image).unwrap_or_else(|e| {
            warn!("Text detector failed, treating as zero detections: {}", e);
            Vec::new()
        });
        let boxes = to_boxes(
            &detections,
            image.width(),
            image.height(),
            &self.config.geometry(),
        );
        let lines = arrange(&boxes, options.line_separation, self.config.line_overlap_ratio);
        let crops: Vec<Crop> = lines
            .iter()
            .filter_map(|line| crop(image, &line.bbox, self.config.crop_padding))
            .collect();

        debug!(
            "{} detections -> {} boxes -> {} lines -> {} crops",
            detections.len(),
            boxes.len(),
            lines.len(),
            crops.len()
        );
        crops
    }

    fn with_crops(
        &self,
        image: &DynamicImage,
        crops: &[Crop],
        options: &ExtractOptions,
    ) -> Extraction {
        let explicit = options.explicit_language().map(LanguageCodes::to_ocr);
        let mut language = match &explicit {
            Some(code) => code.clone(),
            None => match self.language.strategy() {
                LanguageStrategy::ImageConfidence => self
                    .language
                    .guess_from_crop(&crops[0], self.models.recognizers()),
                LanguageStrategy::TextStatistics => self.language.fallback().to_string(),
            },
        };

        let handwriting = self.models.handwriting();
        let mut hint = options.text_type;
        if hint == TextTypeHint::Handwritten && handwriting.is_none() {
            warn!("Handwriting requested but no handwriting model is loaded");
            hint = TextTypeHint::Printed;
        }

        let (text_type, transcript) = match hint {
            TextTypeHint::Printed => (TextType::Printed, self.read_printed(crops, &language)),
            TextTypeHint::Handwritten => (
                TextType::Handwritten,
                read_handwriting(handwriting.map(Arc::as_ref), crops),
            ),
            TextTypeHint::Auto => match self.classifier.strategy() {
                TextTypeStrategy::Pixel => match self.classifier.classify_crops(crops) {
                    TextType::Handwritten if handwriting.is_some() => (
                        TextType::Handwritten,
                        read_handwriting(handwriting.map(Arc::as_ref), crops),
                    ),
                    _ => (TextType::Printed, self.read_printed(crops, &language)),
                },
                TextTypeStrategy::Confidence => {
                    let printed = self.read_printed(crops, &language);
                    let written = read_handwriting(handwriting.map(Arc::as_ref), crops);
                    let decision = classify_by_confidence(
                        printed.mean_confidence,
                        !written.is_empty(),
                        self.config.confidence_cutoff,
                    );
                    debug!(
                        "Confidence decision: printed mean {:?}, handwriting empty {} -> {}",
                        printed.mean_confidence,
                        written.is_empty(),
                        decision
                    );
                    match decision {
                        TextType::Handwritten => (TextType::Handwritten, written),
                        TextType::Printed => (TextType::Printed, printed),
                    }
                }
            },
        };

        let mut transcript = transcript;
        if explicit.is_none() && self.language.strategy() == LanguageStrategy::TextStatistics {
            let guessed = self.language.guess_from_text(&transcript.text());
            if text_type == TextType::Printed && guessed != language {
                // Re-read with the recognizer trained for the detected script
                if self.models.recognizers().exact(&guessed).is_some() {
                    transcript = self.read_printed(crops, &guessed);
                }
            }
            language = guessed;
        }

        let line_count = crops.len();
        let source = match text_type {
            TextType::Printed => ExtractionSource::Printed,
            TextType::Handwritten => ExtractionSource::Handwriting,
        };

        if transcript.is_empty() {
            debug!("Primary recognition produced no text, using fallback reader");
            let text = self.read_fallback(image);
            return Extraction {
                detected_language: match explicit {
                    Some(_) => language,
                    None => self.language_of_fallback(&text, language),
                },
                line_count: text.lines().count(),
                text,
                text_type,
                source: ExtractionSource::Fallback,
                corrected: false,
            };
        }

        Extraction {
            text: transcript.text(),
            text_type,
            detected_language: language,
            source,
            line_count,
            corrected: false,
        }
    }

    /// No usable crops: the whole image becomes the single crop
    ///
    /// Handwriting requests read it with the handwriting model. Otherwise
    /// the fallback reader runs first and the printed recognizer reads the
    /// whole image when the reader finds nothing.
    fn without_crops(&self, image: &DynamicImage, options: &ExtractOptions) -> Extraction {
        let explicit = options.explicit_language().map(LanguageCodes::to_ocr);
        let language = explicit
            .clone()
            .unwrap_or_else(|| self.language.fallback().to_string());
        let whole = Crop::whole(image);

        let mut hint = options.text_type;
        if hint == TextTypeHint::Handwritten {
            match (self.models.handwriting(), &whole) {
                (Some(recognizer), Some(whole)) => {
                    let transcript =
                        read_handwriting(Some(recognizer.as_ref()), std::slice::from_ref(whole));
                    if !transcript.is_empty() {
                        return Extraction {
                            text: transcript.text(),
                            text_type: TextType::Handwritten,
                            detected_language: language,
                            source: ExtractionSource::Handwriting,
                            line_count: 1,
                            corrected: false,
                        };
                    }
                }
                (None, _) => {
                    warn!("Handwriting requested but no handwriting model is loaded");
                    hint = TextTypeHint::Printed;
                }
                _ => {}
            }
        }

        let text = self.read_fallback(image);
        if !text.trim().is_empty() || hint == TextTypeHint::Handwritten {
            let detected_language = match explicit {
                Some(code) => code,
                None => self.language_of_fallback(&text, language),
            };
            return Extraction {
                line_count: text.lines().count(),
                text,
                text_type: match hint {
                    TextTypeHint::Handwritten => TextType::Handwritten,
                    _ => TextType::Printed,
                },
                detected_language,
                source: ExtractionSource::Fallback,
                corrected: false,
            };
        }

        let transcript = match &whole {
            Some(whole) => self.read_printed(std::slice::from_ref(whole), &language),
            None => Transcript::default(),
        };
        let text = transcript.text();
        debug!("Whole-image printed read produced {} chars", text.chars().count());
        let detected_language = match explicit {
            Some(code) => code,
            None => self.language_of_fallback(&text, language),
        };
        Extraction {
            line_count: text.lines().count(),
            text,
            text_type: TextType::Printed,
            detected_language,
            source: ExtractionSource::Printed,
            corrected: false,
        }
    }

    /// Printed recognizer for `language` over every crop
    fn read_printed(&self, crops: &[Crop], language: &str) -> Transcript {
        let Some(recognizer) = self.models.recognizers().get(language) else {
            warn!("No printed recognizer available for {}", language);
            return Transcript::default();
        };

        let mut lines = Vec::with_capacity(crops.len());
        let mut scores = Vec::new();
        for (i, c) in crops.iter().enumerate() {
            match recognizer.recognize(c) {
                Ok(rec) => {
                    if !rec.is_empty() {
                        scores.push(rec.confidence);
                    }
                    lines.push(rec.text);
                }
                Err(e) => {
                    warn!("Printed recognition failed on line {}: {}", i, e);
                    lines.push(String::new());
                }
            }
        }

        Transcript {
            lines,
            mean_confidence: mean(&scores),
        }
    }

    /// Secondary reader: detections grouped into lines, texts joined
    ///
    /// Errors are swallowed and yield an empty string.
    fn read_fallback(&self, image: &DynamicImage) -> String {
        let Some(reader) = self.models.page_reader() else {
            debug!("No fallback reader loaded");
            return String::new();
        };

        let detections = match reader.read(image) {
            Ok(d) => d,
            Err(e) => {
                warn!("Fallback reader failed: {}", e);
                return String::new();
            }
        };

        let mut geometry = self.config.geometry();
        // The reader applies its own filtering; keep every box it read
        geometry.min_area = 1;
        geometry.min_side = 1;
        let boxes = to_boxes(&detections, image.width(), image.height(), &geometry);

        group_lines(&boxes, self.config.line_overlap_ratio)
            .iter()
            .map(|line| line.text())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Language for fallback output: statistics on the text when so configured
    fn language_of_fallback(&self, text: &str, current: String) -> String {
        match self.language.strategy() {
            LanguageStrategy::TextStatistics if !text.trim().is_empty() => {
                self.language.guess_from_text(text)
            }
            _ => current,
        }
    }

    fn apply_correction(&self, extraction: &mut Extraction, options: &ExtractOptions) {
        let Some(corrector) = &self.corrector else {
            return;
        };
        if !options.correction.unwrap_or(corrector.config().enabled) {
            return;
        }
        // The vocabulary and scorer are English
        if LanguageCodes::to_translation(&extraction.detected_language) != "en" {
            debug!(
                "Skipping correction for language {}",
                extraction.detected_language
            );
            return;
        }
        if extraction.text.trim().is_empty() {
            return;
        }

        let corrected = corrector.correct_transcript(&extraction.text);
        if corrected != extraction.text {
            debug!("Correction changed transcript");
            extraction.corrected = true;
            extraction.text = corrected;
        }
    }
}

/// Handwriting recognizer over every crop, resized to its input size
fn read_handwriting(recognizer: Option<&dyn LineRecognizer>, crops: &[Crop]) -> Transcript {
    let Some(recognizer) = recognizer else {
        return Transcript::default();
    };

    let mut lines = Vec::with_capacity(crops.len());
    let mut scores = Vec::new();
    for (i, c) in crops.iter().enumerate() {
        let input = match recognizer.input_size() {
            Some((w, h)) => Crop {
                image: c.resized(w, h),
                bbox: c.bbox,
            },
            None => c.clone(),
        };
        match recognizer.recognize(&input) {
            Ok(rec) => {
                if !rec.is_empty() {
                    scores.push(rec.confidence);
                }
                lines.push(rec.text);
            }
            Err(e) => {
                warn!("Handwriting recognition failed on line {}: {}", i, e);
                lines.push(String::new());
            }
        }
    }

    Transcript {
        lines,
        mean_confidence: mean(&scores),
    }
}

fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }
}
