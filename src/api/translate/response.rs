// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

/// Body of a successful translate call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub input_text: String,
    pub translated_text: String,
    /// OCR-side source code (`ch_sim`, not `zh`)
    pub detected_language: String,
}
