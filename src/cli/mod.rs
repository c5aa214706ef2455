// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod extract;
pub mod translate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::AppState;
use crate::config::AppConfig;

/// OCR and translation from the command line
#[derive(Parser, Debug)]
#[command(name = "ocr-cli")]
#[command(version)]
#[command(about = "Extract text from images and translate it locally", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "APP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract text from an image file
    Extract(extract::ExtractArgs),

    /// Translate a piece of text
    Translate(translate::TranslateArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let state = tokio::task::spawn_blocking(move || AppState::load(&config)).await?;

    match cli.command {
        Commands::Extract(args) => extract::run_extract(&state, args).await,
        Commands::Translate(args) => translate::run_translate(&state, args).await,
    }
}
