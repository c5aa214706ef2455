// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Translate API endpoint module
//!
//! Provides POST /api/translate over the sequence-model router or the
//! generative chat service.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{translate_handler, translate_request};
pub use request::{TranslateRequest, TranslationBackend};
pub use response::TranslateResponse;
