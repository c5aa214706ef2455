// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::api::{AppState, ExtractResponse};
use crate::pipeline::ExtractOptions;
use crate::vision::classifier::TextTypeHint;
use crate::vision::lines::LineSeparation;

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Image file (PNG, JPEG, WebP, GIF or BMP)
    pub image: PathBuf,

    /// auto, printed or handwritten
    #[arg(long, default_value = "auto")]
    pub text_type: String,

    /// Language code; omit to guess
    #[arg(long)]
    pub language: Option<String>,

    /// auto or no
    #[arg(long, default_value = "auto")]
    pub line_separation: String,

    /// Run lexical correction on English transcripts
    #[arg(long)]
    pub correct: bool,

    /// Print the response as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExtractArgs {
    pub fn options(&self) -> Result<ExtractOptions> {
        Ok(ExtractOptions {
            text_type: self
                .text_type
                .parse::<TextTypeHint>()
                .map_err(|e| anyhow!(e))?,
            input_language: self.language.clone(),
            line_separation: self
                .line_separation
                .parse::<LineSeparation>()
                .map_err(|e| anyhow!(e))?,
            correction: self.correct.then_some(true),
        })
    }
}

pub async fn run_extract(state: &AppState, args: ExtractArgs) -> Result<()> {
    let options = args.options()?;
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    info!("Extracting text from {}", args.image.display());

    let orchestrator = state.orchestrator.clone();
    let max_bytes = state.max_upload_bytes;
    let extraction = tokio::task::spawn_blocking(move || {
        orchestrator.extract_upload(&bytes, max_bytes, &options)
    })
    .await??;

    if args.json {
        let response = ExtractResponse::from(extraction);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        eprintln!(
            "{} text, language {}",
            extraction.text_type, extraction.detected_language
        );
        println!("{}", extraction.text);
    }
    Ok(())
}
