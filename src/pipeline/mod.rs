// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Extraction pipeline
//!
//! image -> boxes -> lines -> crops -> type/language decision ->
//! recognition -> optional correction

pub mod orchestrator;
pub mod scratch;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vision::classifier::{TextType, TextTypeHint};
use crate::vision::geometry::GeometryConfig;
use crate::vision::image_utils::ImageError;
use crate::vision::lines::LineSeparation;

pub use orchestrator::RecognitionOrchestrator;
pub use scratch::ScratchDir;

/// Tunables for the geometric stages and the confidence decision
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub min_box_area: u32,
    pub min_box_side: u32,
    pub line_overlap_ratio: f32,
    /// Printed mean confidence below this favours handwriting
    pub confidence_cutoff: f32,
    pub crop_padding: u32,
    /// Write line crops into the request scratch directory
    pub keep_crops: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_box_area: 100,
            min_box_side: 5,
            line_overlap_ratio: 0.5,
            confidence_cutoff: 0.8,
            crop_padding: 10,
            keep_crops: false,
        }
    }
}

impl PipelineConfig {
    pub fn geometry(&self) -> GeometryConfig {
        GeometryConfig {
            min_area: self.min_box_area,
            min_side: self.min_box_side,
        }
    }
}

/// Per-request choices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOptions {
    pub text_type: TextTypeHint,
    /// `None` (or `auto`) lets the language guesser decide
    pub input_language: Option<String>,
    pub line_separation: LineSeparation,
    /// `None` follows `correction.enabled`
    pub correction: Option<bool>,
}

impl ExtractOptions {
    /// Explicit language, treating `auto` and blanks as absent
    pub fn explicit_language(&self) -> Option<&str> {
        self.input_language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("auto"))
    }
}

/// Which path produced the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Printed,
    Handwriting,
    Fallback,
}

/// Result of one extraction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub text: String,
    pub text_type: TextType,
    /// OCR-side language code
    pub detected_language: String,
    pub source: ExtractionSource,
    pub line_count: usize,
    pub corrected: bool,
}

/// Errors that stop an extraction before recognition starts
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("Failed to prepare scratch directory: {0}")]
    Scratch(#[from] std::io::Error),

    #[error("No OCR models are loaded")]
    Unavailable,
}
