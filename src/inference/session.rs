// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX session construction

use anyhow::{Context, Result};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

/// Intra-op threads per session
const INTRA_THREADS: usize = 4;

/// Fail with "`label` not found: path" when a required file is missing
pub fn require_file(path: &Path, label: &str) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("{} not found: {}", label, path.display());
    }
    Ok(())
}

/// Load a model file into a CPU-only session
pub fn build_cpu_session(model_path: &Path, label: &str) -> Result<Session> {
    require_file(model_path, label)?;

    Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(INTRA_THREADS)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!("Failed to load {} from {}", label, model_path.display()))
}

/// Declared input names of a session
pub fn input_names(session: &Session) -> Vec<String> {
    session.inputs.iter().map(|i| i.name.clone()).collect()
}

/// Load a HuggingFace `tokenizer.json`
pub fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    require_file(path, "Tokenizer file")?;
    Tokenizer::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))
}

/// First existing candidate among `dir/name` and `dir/onnx/name`
pub fn locate(dir: &Path, name: &str) -> PathBuf {
    let nested = dir.join("onnx").join(name);
    if nested.exists() {
        nested
    } else {
        dir.join(name)
    }
}
