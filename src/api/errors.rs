// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::pipeline::ExtractError;
use crate::translation::TranslationError;
use crate::vision::image_utils::ImageError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    UnsupportedLanguage(String),
    TranslationNotSupported {
        from: String,
        to: String,
        missing: String,
    },
    ServiceUnavailable(String),
    /// The external translation service failed
    BadGateway(String),
    InternalError(String),
    /// An external service exceeded its deadline
    Timeout { secs: u64, message: String },
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::UnsupportedLanguage(code) => {
                let mut details = HashMap::new();
                details.insert(
                    "language".to_string(),
                    serde_json::Value::String(code.clone()),
                );
                (
                    "unsupported_language",
                    format!("Unsupported language: {}", code),
                    Some(details),
                )
            }
            ApiError::TranslationNotSupported { from, to, missing } => {
                let mut details = HashMap::new();
                details.insert(
                    "missing_pair".to_string(),
                    serde_json::Value::String(missing.clone()),
                );
                (
                    "translation_not_supported",
                    format!("Translation from {} to {} is not supported", from, to),
                    Some(details),
                )
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone(), None),
            ApiError::BadGateway(msg) => ("translation_service_error", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
            ApiError::Timeout { secs, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "timeout_secs".to_string(),
                    serde_json::Value::Number((*secs).into()),
                );
                ("timeout", message.clone(), Some(details))
            }
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::ValidationError { .. }
            | ApiError::UnsupportedLanguage(_) => 400,
            ApiError::TranslationNotSupported { .. } => 404,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::Timeout { .. } => 504,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error on {}: {}", field, message)
            }
            ApiError::UnsupportedLanguage(code) => write!(f, "Unsupported language: {}", code),
            ApiError::TranslationNotSupported { from, to, .. } => {
                write!(f, "Translation from {} to {} is not supported", from, to)
            }
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Translation service error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Timeout { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let request_id = uuid::Uuid::new_v4().to_string();
        if status.is_server_error() {
            tracing::warn!(request_id = %request_id, "{}", self);
        } else {
            tracing::debug!(request_id = %request_id, "{}", self);
        }
        (status, axum::Json(self.to_response(Some(request_id)))).into_response()
    }
}

impl From<TranslationError> for ApiError {
    fn from(e: TranslationError) -> Self {
        match e {
            TranslationError::NotSupported { from, to, missing } => {
                ApiError::TranslationNotSupported {
                    from,
                    to,
                    missing: missing.to_string(),
                }
            }
            TranslationError::UnsupportedLanguage(code) => ApiError::UnsupportedLanguage(code),
            TranslationError::Service(msg) => ApiError::BadGateway(msg),
            e @ TranslationError::Timeout(secs) => ApiError::Timeout {
                secs,
                message: e.to_string(),
            },
            e @ (TranslationError::ModelLoad { .. } | TranslationError::Failed(_)) => {
                ApiError::InternalError(e.to_string())
            }
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::EncodeFailed(msg) => ApiError::InternalError(msg),
            other => ApiError::validation("image", other.to_string()),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::Image(image) => image.into(),
            ExtractError::Unavailable => {
                ApiError::ServiceUnavailable("No OCR models are loaded".to_string())
            }
            ExtractError::Scratch(io) => ApiError::InternalError(io.to_string()),
        }
    }
}
