// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Translate endpoint handler

use axum::{extract::State, Json};
use tracing::{debug, info, warn};

use super::request::{TranslateRequest, TranslationBackend};
use super::response::TranslateResponse;
use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::vision::language::{LanguageCodes, LanguageGuesser};

/// POST /api/translate - Translate text into a target language
///
/// # Request
/// - `text`: text to translate (required)
/// - `language`: target language code (required)
/// - `input_language`: source code or `auto` (default)
/// - `translation_model`: `mt` (default) or `llm`
///
/// # Errors
/// - 400 Bad Request: missing text/language, unsupported language
/// - 404 Not Found: no direct or pivot route for the pair
/// - 502 Bad Gateway / 504 Gateway Timeout: generative service failed
/// - 503 Service Unavailable: requested backend not configured
pub async fn translate_handler(
    State(state): State<AppState>,
    Json(request): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    translate_request(&state, &request).await.map(Json)
}

/// Validate, resolve languages and run the requested backend
///
/// Shared by the HTTP handler and the command-line tool.
pub async fn translate_request(
    state: &AppState,
    request: &TranslateRequest,
) -> Result<TranslateResponse, ApiError> {
    request.validate()?;
    let text = request.text().to_string();
    let target = request.target().to_string();
    if !LanguageCodes::is_known(&target) {
        return Err(ApiError::UnsupportedLanguage(target));
    }
    let source = resolve_source(request, &state.language)?;
    debug!(
        "Translate request: {} chars, {} -> {}, backend={:?}",
        text.chars().count(),
        source,
        target,
        request.translation_model
    );

    let translated = match request.translation_model {
        TranslationBackend::Mt => {
            let router = state.router.clone().ok_or_else(|| {
                ApiError::ServiceUnavailable("Translation models are not configured".to_string())
            })?;
            let from = LanguageCodes::to_translation(&source);
            let to = LanguageCodes::to_translation(&target);
            let input = text.clone();
            tokio::task::spawn_blocking(move || router.translate(&input, &from, &to))
                .await
                .map_err(|e| {
                    warn!("Translation task failed: {}", e);
                    ApiError::InternalError("Translation task failed".to_string())
                })??
        }
        TranslationBackend::Llm => {
            let llm = state.llm.clone().ok_or_else(|| {
                ApiError::ServiceUnavailable("LLM translator is not configured".to_string())
            })?;
            if LanguageCodes::to_ocr(&source) == LanguageCodes::to_ocr(&target) {
                text.clone()
            } else {
                llm.translate(&text, &target).await?
            }
        }
    };

    info!(
        "Translated {} chars {} -> {}",
        text.chars().count(),
        source,
        target
    );
    Ok(TranslateResponse {
        input_text: text,
        translated_text: translated,
        detected_language: source,
    })
}

/// OCR-side source code: explicit, or detected and supported
fn resolve_source(
    request: &TranslateRequest,
    guesser: &LanguageGuesser,
) -> Result<String, ApiError> {
    if let Some(code) = request.explicit_source() {
        if !LanguageCodes::is_known(code) {
            return Err(ApiError::UnsupportedLanguage(code.to_string()));
        }
        return Ok(LanguageCodes::to_ocr(code));
    }

    match guesser.detect_text(request.text()) {
        Some(code) if guesser.is_supported(&code) => Ok(code),
        Some(code) => Err(ApiError::UnsupportedLanguage(code)),
        None => Ok(guesser.fallback().to_string()),
    }
}
