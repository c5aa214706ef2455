// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::version;
use crate::vision::model_manager::VisionModelInfo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub ocr: bool,
    pub handwriting: bool,
    pub fallback_reader: bool,
    pub correction: bool,
    pub translation: bool,
    pub llm: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// `ok` when extraction works, `degraded` otherwise
    pub status: &'static str,
    pub version: &'static str,
    pub services: ServiceStatus,
    pub models: Vec<VisionModelInfo>,
    pub languages: Vec<String>,
}

impl HealthResponse {
    pub fn from_state(state: &AppState) -> Self {
        let models = state.orchestrator.models();
        let services = ServiceStatus {
            ocr: models.has_ocr(),
            handwriting: models.has_handwriting(),
            fallback_reader: models.page_reader().is_some(),
            correction: state.orchestrator.has_corrector(),
            translation: state.router.is_some(),
            llm: state.llm.is_some(),
        };

        Self {
            status: if state.orchestrator.is_ready() {
                "ok"
            } else {
                "degraded"
            },
            version: version::VERSION_NUMBER,
            services,
            models: models.list_models(),
            languages: state.language.config().supported.clone(),
        }
    }
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_state(&state))
}
