// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod correction;
pub mod inference;
pub mod pipeline;
pub mod translation;
pub mod version;
pub mod vision;

pub use config::AppConfig;
pub use correction::{CandidateGenerator, LexicalCorrector, MaskedScorer};
pub use pipeline::{ExtractOptions, Extraction, RecognitionOrchestrator};
pub use translation::{LanguagePair, TranslationError, TranslationRouter};
pub use vision::{Crop, Detection, Line, PixelBox, TextBox, TextType};
