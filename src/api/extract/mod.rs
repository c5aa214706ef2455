// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Extract API endpoint module
//!
//! Provides POST /api/extract for reading text out of an uploaded image.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::extract_handler;
pub use request::ExtractForm;
pub use response::ExtractResponse;
