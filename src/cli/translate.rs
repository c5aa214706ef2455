// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Args;

use crate::api::{translate_request, AppState, TranslateRequest, TranslationBackend};

/// Arguments for the translate command
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Text to translate
    pub text: String,

    /// Target language code
    #[arg(long)]
    pub to: String,

    /// Source language code; omit to detect
    #[arg(long)]
    pub from: Option<String>,

    /// Use the generative translation service instead of local models
    #[arg(long)]
    pub llm: bool,
}

impl TranslateArgs {
    pub fn request(&self) -> TranslateRequest {
        TranslateRequest {
            text: self.text.clone(),
            language: self.to.clone(),
            input_language: self.from.clone(),
            translation_model: if self.llm {
                TranslationBackend::Llm
            } else {
                TranslationBackend::Mt
            },
        }
    }
}

pub async fn run_translate(state: &AppState, args: TranslateArgs) -> Result<()> {
    let response = translate_request(state, &args.request()).await?;
    eprintln!(
        "{} -> {}",
        response.detected_language,
        args.to.trim().to_lowercase()
    );
    println!("{}", response.translated_text);
    Ok(())
}
