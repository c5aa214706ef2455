// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request helpers for driving the router in-process

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use ocr_translate_node::api::{create_router, AppState};
use ocr_translate_node::pipeline::PipelineConfig;
use ocr_translate_node::translation::LlmConfig;
use ocr_translate_node::translation::LlmTranslator;
use ocr_translate_node::vision::classifier::ClassifierConfig;
use ocr_translate_node::vision::language::LanguageConfig;
use ocr_translate_node::vision::{LanguageGuesser, TextTypeClassifier, VisionModelManager};
use ocr_translate_node::{RecognitionOrchestrator, TranslationRouter};

pub const BOUNDARY: &str = "----ocr-test-boundary";
pub const MAX_UPLOAD: usize = 2 * 1024 * 1024;

pub fn state(models: VisionModelManager, router: Option<Arc<TranslationRouter>>) -> AppState {
    let orchestrator = RecognitionOrchestrator::new(
        models,
        TextTypeClassifier::new(ClassifierConfig::default()),
        LanguageGuesser::new(LanguageConfig::default()),
        PipelineConfig::default(),
    );
    AppState::from_parts(
        orchestrator,
        router,
        None,
        LanguageGuesser::new(LanguageConfig::default()),
        MAX_UPLOAD,
    )
}

/// Adds a chat translator pointed at a closed port
pub fn with_unreachable_llm(state: AppState) -> AppState {
    with_llm(state, "http://127.0.0.1:9", 1)
}

pub fn with_llm(mut state: AppState, endpoint: &str, timeout_secs: u64) -> AppState {
    let llm = LlmTranslator::new(LlmConfig {
        endpoint: endpoint.to_string(),
        timeout_secs,
        ..Default::default()
    })
    .expect("llm client");
    state.llm = Some(Arc::new(llm));
    state
}

/// One form part: `(name, filename, bytes)`
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub data: Vec<u8>,
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &str) -> Self {
        Self {
            name,
            filename: None,
            data: value.as_bytes().to_vec(),
        }
    }

    pub fn file(name: &'a str, filename: &'a str, data: Vec<u8>) -> Self {
        Self {
            name,
            filename: Some(filename),
            data,
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn post_multipart(state: AppState, uri: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(state, request).await
}

pub async fn post_json(state: AppState, uri: &str, json: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap();
    send(state, request).await
}

pub async fn get(state: AppState, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(state, request).await
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}
