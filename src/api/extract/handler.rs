// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Extract endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use tracing::{debug, info, warn};

use super::request::ExtractForm;
use super::response::ExtractResponse;
use crate::api::errors::ApiError;
use crate::api::state::AppState;

/// POST /api/extract - Extract text from an uploaded image
///
/// # Form fields
/// - `image`: the image file (required; PNG, JPEG, WebP, GIF or BMP)
/// - `text_type`: `auto` | `printed` | `handwritten`
/// - `input_language`: `auto` or a language code
/// - `line_separation`: `auto` | `no`
/// - `correction`: `auto` | `on` | `off`
///
/// # Errors
/// - 400 Bad Request: missing or undecodable image, invalid field value
/// - 503 Service Unavailable: no OCR model loaded
pub async fn extract_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractResponse>, ApiError> {
    let form = ExtractForm::from_multipart(multipart).await?;
    let (image, options) = form.into_parts()?;
    debug!(
        "Extract request: {} bytes, text_type={:?}, language={:?}",
        image.len(),
        options.text_type,
        options.input_language
    );

    let orchestrator = state.orchestrator.clone();
    let max_bytes = state.max_upload_bytes;
    let extraction = tokio::task::spawn_blocking(move || {
        orchestrator.extract_upload(&image, max_bytes, &options)
    })
    .await
    .map_err(|e| {
        warn!("Extraction task failed: {}", e);
        ApiError::InternalError("Extraction task failed".to_string())
    })??;

    info!(
        "Extracted {} chars ({}, {}, {} lines)",
        extraction.text.chars().count(),
        extraction.text_type,
        extraction.detected_language,
        extraction.line_count
    );
    Ok(Json(extraction.into()))
}
