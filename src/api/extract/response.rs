// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

use crate::pipeline::Extraction;
use crate::vision::classifier::TextType;

/// Body of a successful extract call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub extracted_text: String,
    pub text_type: TextType,
    pub detected_language: String,
}

impl From<Extraction> for ExtractResponse {
    fn from(extraction: Extraction) -> Self {
        Self {
            extracted_text: extraction.text,
            text_type: extraction.text_type,
            detected_language: extraction.detected_language,
        }
    }
}
