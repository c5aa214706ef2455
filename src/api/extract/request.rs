// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Extract request form and validation

use axum_extra::extract::Multipart;

use crate::api::errors::ApiError;
use crate::pipeline::ExtractOptions;
use crate::vision::classifier::TextTypeHint;
use crate::vision::lines::LineSeparation;

/// Raw multipart fields of an extract request
#[derive(Debug, Clone, Default)]
pub struct ExtractForm {
    pub image: Option<Vec<u8>>,
    pub text_type: Option<String>,
    pub input_language: Option<String>,
    pub line_separation: Option<String>,
    pub correction: Option<String>,
}

impl ExtractForm {
    /// Read every known field; unknown fields are ignored
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let bytes = field.bytes().await.map_err(|e| {
                        ApiError::validation("image", format!("Failed to read upload: {}", e))
                    })?;
                    form.image = Some(bytes.to_vec());
                }
                "text_type" | "input_language" | "line_separation" | "correction" => {
                    let value = field.text().await.map_err(|e| {
                        ApiError::validation(&name, format!("Failed to read field: {}", e))
                    })?;
                    let slot = match name.as_str() {
                        "text_type" => &mut form.text_type,
                        "input_language" => &mut form.input_language,
                        "line_separation" => &mut form.line_separation,
                        _ => &mut form.correction,
                    };
                    *slot = Some(value);
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Upload bytes plus typed options
    pub fn into_parts(self) -> Result<(Vec<u8>, ExtractOptions), ApiError> {
        let image = self
            .image
            .filter(|b| !b.is_empty())
            .ok_or_else(|| ApiError::validation("image", "image is required"))?;

        let text_type = match self.text_type.as_deref() {
            Some(v) => v
                .parse::<TextTypeHint>()
                .map_err(|e| ApiError::validation("text_type", e))?,
            None => TextTypeHint::Auto,
        };
        let line_separation = match self.line_separation.as_deref() {
            Some(v) => v
                .parse::<LineSeparation>()
                .map_err(|e| ApiError::validation("line_separation", e))?,
            None => LineSeparation::Auto,
        };
        let correction = match self.correction.as_deref() {
            Some(v) => parse_correction(v)?,
            None => None,
        };
        let input_language = self
            .input_language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        Ok((
            image,
            ExtractOptions {
                text_type,
                input_language,
                line_separation,
                correction,
            },
        ))
    }
}

/// `auto` follows the server default
fn parse_correction(value: &str) -> Result<Option<bool>, ApiError> {
    match value.trim().to_lowercase().as_str() {
        "" | "auto" => Ok(None),
        "on" | "true" | "yes" | "1" => Ok(Some(true)),
        "off" | "false" | "no" | "0" => Ok(Some(false)),
        other => Err(ApiError::validation(
            "correction",
            format!("Invalid correction '{}': expected auto, on or off", other),
        )),
    }
}
