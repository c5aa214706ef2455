// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod extract;
pub mod health;
pub mod server;
pub mod state;
pub mod translate;

pub use errors::{ApiError, ErrorResponse};
pub use extract::{extract_handler, ExtractForm, ExtractResponse};
pub use health::{HealthResponse, ServiceStatus};
pub use server::{create_router, start_server};
pub use state::AppState;
pub use translate::{
    translate_handler, translate_request, TranslateRequest, TranslateResponse, TranslationBackend,
};
