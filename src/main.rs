// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use ocr_translate_node::{
    api::{start_server, AppState},
    config::AppConfig,
    version,
};
use std::{env, path::PathBuf};

/// OCR and translation HTTP node
#[derive(Parser, Debug)]
#[command(name = "ocr-translate-node", version)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "APP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting OCR Translate Node...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref())?;
    tracing::info!("{}", version::get_version_string());

    println!("🧠 Loading models...");
    let server_config = config.server.clone();
    let state = tokio::task::spawn_blocking(move || AppState::load(&config)).await?;
    println!("✅ Models loaded: {:?}", state);

    println!("🌐 Listening on {}:{}", server_config.host, server_config.port);
    start_server(&server_config, state).await?;

    println!("👋 Node stopped");
    Ok(())
}
