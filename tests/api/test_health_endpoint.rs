// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GET /health and GET /version

use axum::http::StatusCode;

use ocr_translate_node::vision::ocr::RecognizerSet;
use ocr_translate_node::vision::VisionModelManager;

use super::support::{get, state};
use crate::common::hello_world_models;

#[tokio::test]
async fn test_health_reports_services() {
    let (status, body) = get(state(hello_world_models(0.9), None), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["ocr"], true);
    assert_eq!(body["services"]["handwriting"], true);
    assert_eq!(body["services"]["translation"], false);
    assert_eq!(body["services"]["correction"], false);
    assert!(body["languages"]
        .as_array()
        .unwrap()
        .iter()
        .any(|l| l == "ch_sim"));
}

#[tokio::test]
async fn test_health_degraded_without_models() {
    let models = VisionModelManager::from_parts(None, RecognizerSet::new("en"), None, None);
    let (status, body) = get(state(models, None), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["ocr"], false);
}

#[tokio::test]
async fn test_version_endpoint() {
    let (status, body) = get(state(hello_world_models(0.9), None), "/version").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_object());
}
