// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generative translation through an Ollama-style chat endpoint

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::{LlmConfig, TranslationError};
use crate::vision::language::LanguageCodes;

// --- Ollama /api/chat serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    options: ChatOptions,
    stream: bool,
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct ChatOptions {
    temperature: f32,
    num_ctx: u32,
    num_predict: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: String,
}

const SYSTEM_PROMPT: &str = "You are a precise translator. Output only the translated text in the target language. \
Never add explanations, notes, answers to questions, or extra content. \
Preserve formatting, line breaks, and punctuation exactly. Fix obvious OCR/spelling errors naturally.";

/// Client for the chat translation service
pub struct LlmTranslator {
    client: Client,
    endpoint: String,
    config: LlmConfig,
}

impl std::fmt::Debug for LlmTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmTranslator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl LlmTranslator {
    pub fn new(config: LlmConfig) -> Result<Self, TranslationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranslationError::Service(e.to_string()))?;

        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        info!(
            "LLM translator configured: endpoint={}, model={}",
            endpoint, config.model
        );

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.config.model
    }

    /// Translate `text` into the language named by `target` (any code form)
    pub async fn translate(&self, text: &str, target: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let user_prompt = build_user_prompt(text, target);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            options: ChatOptions {
                temperature: 0.0,
                num_ctx: self.config.num_ctx,
                num_predict: self.config.num_predict,
            },
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?
            .error_for_status()
            .map_err(|e| self.map_error(e))?;

        let chat: ChatResponse = response.json().await.map_err(|e| self.map_error(e))?;
        debug!("LLM translation returned {} chars", chat.message.content.len());
        Ok(chat.message.content.trim().to_string())
    }

    fn map_error(&self, e: reqwest::Error) -> TranslationError {
        if e.is_timeout() {
            TranslationError::Timeout(self.config.timeout_secs)
        } else {
            TranslationError::Service(e.to_string())
        }
    }
}

fn build_user_prompt(text: &str, target: &str) -> String {
    format!(
        "Translate the following to {}:\n\n{}",
        LanguageCodes::display_name(target),
        text
    )
}
