// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat translation client against a local stand-in service

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ocr_translate_node::translation::{LlmConfig, LlmTranslator};
use ocr_translate_node::TranslationError;

/// Serves `app` on an ephemeral port and returns its base URL
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn translator(endpoint: String, timeout_secs: u64) -> LlmTranslator {
    LlmTranslator::new(LlmConfig {
        endpoint,
        model: "test-model".to_string(),
        timeout_secs,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_reply_is_trimmed_and_request_is_shaped() {
    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let captured = seen.clone();
    let app = Router::new().route(
        "/api/chat",
        post(move |Json(body): Json<Value>| {
            let captured = captured.clone();
            async move {
                *captured.lock().unwrap() = Some(body);
                Json(json!({ "message": { "role": "assistant", "content": "  Hello world \n" } }))
            }
        }),
    );
    let base = serve(app).await;

    let out = translator(format!("{}/", base), 5)
        .translate("Bonjour le monde", "en")
        .await
        .unwrap();
    assert_eq!(out, "Hello world");

    let body = seen.lock().unwrap().clone().unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["stream"], false);
    assert_eq!(body["options"]["temperature"], 0.0);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(
        body["messages"][1]["content"],
        "Translate the following to English:\n\nBonjour le monde"
    );
}

#[tokio::test]
async fn test_error_status_is_service_error() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model not loaded") }),
    );
    let base = serve(app).await;

    let err = translator(base, 5).translate("Bonjour", "en").await.unwrap_err();
    assert!(matches!(err, TranslationError::Service(_)));
}

#[tokio::test]
async fn test_malformed_reply_is_service_error() {
    let app = Router::new().route("/api/chat", post(|| async { Json(json!({ "done": true })) }));
    let base = serve(app).await;

    let err = translator(base, 5).translate("Bonjour", "en").await.unwrap_err();
    assert!(matches!(err, TranslationError::Service(_)));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let app = Router::new().route(
        "/api/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "message": { "content": "late" } }))
        }),
    );
    let base = serve(app).await;

    let err = translator(base, 1).translate("Bonjour", "en").await.unwrap_err();
    assert_eq!(err, TranslationError::Timeout(1));
}

#[tokio::test]
async fn test_blank_text_never_reaches_service() {
    let out = translator("http://127.0.0.1:9".to_string(), 1)
        .translate("   \n", "ja")
        .await
        .unwrap();
    assert_eq!(out, "");
}
