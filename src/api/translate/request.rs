// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Translate request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// Which translation backend serves the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackend {
    /// Per-pair sequence models with pivot routing
    #[default]
    Mt,
    /// Generative chat service
    Llm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: String,

    /// Target language code
    #[serde(default)]
    pub language: String,

    /// Source language code, or `auto`
    #[serde(default)]
    pub input_language: Option<String>,

    #[serde(default)]
    pub translation_model: TranslationBackend,
}

impl TranslateRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.text.trim().is_empty() {
            return Err(ApiError::validation("text", "text is required"));
        }
        if self.language.trim().is_empty() {
            return Err(ApiError::validation("language", "language is required"));
        }
        Ok(())
    }

    pub fn text(&self) -> &str {
        self.text.trim()
    }

    pub fn target(&self) -> &str {
        self.language.trim()
    }

    /// Explicit source language; `auto` and blanks mean detect
    pub fn explicit_source(&self) -> Option<&str> {
        self.input_language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("auto"))
    }
}
