// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Language guessing and language-code normalization
//!
//! OCR models and translation models name languages differently
//! (`ch_sim` vs `zh`). All conversions go through `LanguageCodes`.

use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

use super::crop::Crop;
use super::ocr::RecognizerSet;

/// (OCR code, translation code, English name, detector language)
const LANGUAGE_TABLE: &[(&str, &str, &str, Language)] = &[
    ("en", "en", "English", Language::English),
    ("fr", "fr", "French", Language::French),
    ("de", "de", "German", Language::German),
    ("es", "es", "Spanish", Language::Spanish),
    ("it", "it", "Italian", Language::Italian),
    ("pt", "pt", "Portuguese", Language::Portuguese),
    ("nl", "nl", "Dutch", Language::Dutch),
    ("pl", "pl", "Polish", Language::Polish),
    ("tr", "tr", "Turkish", Language::Turkish),
    ("ru", "ru", "Russian", Language::Russian),
    ("uk", "uk", "Ukrainian", Language::Ukrainian),
    ("ar", "ar", "Arabic", Language::Arabic),
    ("hi", "hi", "Hindi", Language::Hindi),
    ("vi", "vi", "Vietnamese", Language::Vietnamese),
    ("ch_sim", "zh", "Chinese", Language::Chinese),
    ("ja", "ja", "Japanese", Language::Japanese),
    ("ko", "ko", "Korean", Language::Korean),
];

/// Alternate spellings mapped to OCR codes
const ALIASES: &[(&str, &str)] = &[
    ("zh", "ch_sim"),
    ("zh-cn", "ch_sim"),
    ("zh_cn", "ch_sim"),
    ("zh-hans", "ch_sim"),
    ("ch_tra", "ch_sim"),
    ("zh-tw", "ch_sim"),
    ("zh_tw", "ch_sim"),
    ("zh-hant", "ch_sim"),
];

/// Central language-code table
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageCodes;

impl LanguageCodes {
    fn normalize(code: &str) -> String {
        code.trim().to_lowercase()
    }

    /// OCR-side code (`zh`, `zh-cn` -> `ch_sim`)
    pub fn to_ocr(code: &str) -> String {
        let code = Self::normalize(code);
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == code)
            .map(|(_, ocr)| ocr.to_string())
            .unwrap_or(code)
    }

    /// Translation-side code (`ch_sim` -> `zh`)
    pub fn to_translation(code: &str) -> String {
        let ocr = Self::to_ocr(code);
        LANGUAGE_TABLE
            .iter()
            .find(|(o, ..)| *o == ocr)
            .map(|(_, t, ..)| t.to_string())
            .unwrap_or(ocr)
    }

    /// English name for prompts; unknown codes are returned as-is
    pub fn display_name(code: &str) -> String {
        let ocr = Self::to_ocr(code);
        LANGUAGE_TABLE
            .iter()
            .find(|(o, ..)| *o == ocr)
            .map(|(_, _, name, _)| name.to_string())
            .unwrap_or(ocr)
    }

    /// Whether the code names a language this service knows about at all
    pub fn is_known(code: &str) -> bool {
        let ocr = Self::to_ocr(code);
        LANGUAGE_TABLE.iter().any(|(o, ..)| *o == ocr)
    }

    fn to_lingua(code: &str) -> Option<Language> {
        let ocr = Self::to_ocr(code);
        LANGUAGE_TABLE
            .iter()
            .find(|(o, ..)| *o == ocr)
            .map(|(.., lang)| *lang)
    }

    fn from_lingua(language: Language) -> Option<&'static str> {
        LANGUAGE_TABLE
            .iter()
            .find(|(.., lang)| *lang == language)
            .map(|(o, ..)| *o)
    }
}

/// Which signal `auto` language requests on images use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguageStrategy {
    /// Highest recognizer confidence on a representative crop
    #[default]
    ImageConfidence,
    /// Statistical detection on the extracted text
    TextStatistics,
}

impl FromStr for LanguageStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" | "image_confidence" => Ok(Self::ImageConfidence),
            "text" | "text_statistics" => Ok(Self::TextStatistics),
            other => Err(format!("Unknown language strategy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    pub strategy: LanguageStrategy,
    /// OCR-side codes, in the order they are tried
    pub supported: Vec<String>,
    pub fallback: String,
    /// Shorter text is not run through statistical detection
    pub min_text_chars: usize,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            strategy: LanguageStrategy::default(),
            supported: ["en", "fr", "ch_sim", "ru", "ja"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fallback: "en".to_string(),
            min_text_chars: 3,
        }
    }
}

/// Picks a best-guess language from recognizer confidence or from text
pub struct LanguageGuesser {
    config: LanguageConfig,
    supported: Vec<String>,
    detector: LanguageDetector,
}

impl std::fmt::Debug for LanguageGuesser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageGuesser")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LanguageGuesser {
    pub fn new(config: LanguageConfig) -> Self {
        let supported = config
            .supported
            .iter()
            .map(|c| LanguageCodes::to_ocr(c))
            .collect();
        // Detect over every known language so out-of-set text is reported
        // as such instead of being forced onto the nearest supported one.
        let languages: Vec<Language> = LANGUAGE_TABLE.iter().map(|(.., l)| *l).collect();
        let detector = LanguageDetectorBuilder::from_languages(&languages)
            .with_minimum_relative_distance(0.1)
            .build();

        Self {
            config,
            supported,
            detector,
        }
    }

    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    pub fn strategy(&self) -> LanguageStrategy {
        self.config.strategy
    }

    pub fn fallback(&self) -> &str {
        &self.config.fallback
    }

    pub fn is_supported(&self, code: &str) -> bool {
        let ocr = LanguageCodes::to_ocr(code);
        self.supported.iter().any(|s| *s == ocr)
    }

    /// Image-confidence strategy
    ///
    /// Each supported language with a registered recognizer reads `crop`;
    /// the language whose non-empty result has the highest confidence wins.
    /// Earlier languages win ties. Failures are skipped.
    pub fn guess_from_crop(&self, crop: &Crop, recognizers: &RecognizerSet) -> String {
        let mut best: Option<(&str, f32)> = None;

        for language in &self.supported {
            let Some(recognizer) = recognizers.exact(language) else {
                continue;
            };
            match recognizer.recognize(crop) {
                Ok(rec) if !rec.is_empty() => {
                    debug!("Language {} confidence {:.3}", language, rec.confidence);
                    if best.map_or(true, |(_, c)| rec.confidence > c) {
                        best = Some((language.as_str(), rec.confidence));
                    }
                }
                Ok(_) => {}
                Err(e) => warn!("Recognizer for {} failed during language guess: {}", language, e),
            }
        }

        best.map(|(l, _)| l.to_string())
            .unwrap_or_else(|| self.config.fallback.clone())
    }

    /// Detected OCR-side code for `text`, supported or not
    ///
    /// `None` when the text is too short or ambiguous.
    pub fn detect_text(&self, text: &str) -> Option<String> {
        let letters = text.chars().filter(|c| c.is_alphabetic()).count();
        if letters < self.config.min_text_chars {
            return None;
        }
        let language = self.detector.detect_language_of(text)?;
        LanguageCodes::from_lingua(language).map(str::to_string)
    }

    /// Text-statistics strategy: detected code if supported, else fallback
    pub fn guess_from_text(&self, text: &str) -> String {
        match self.detect_text(text) {
            Some(code) if self.is_supported(&code) => code,
            Some(code) => {
                debug!("Detected unsupported language {}, using fallback", code);
                self.config.fallback.clone()
            }
            None => self.config.fallback.clone(),
        }
    }
}

impl Default for LanguageGuesser {
    fn default() -> Self {
        Self::new(LanguageConfig::default())
    }
}
