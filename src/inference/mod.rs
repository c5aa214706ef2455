// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared ONNX Runtime plumbing
//!
//! - `session` - CPU session construction and file checks
//! - `seq2seq` - encoder-decoder greedy generation used by the handwriting
//!   recognizer and the translation models

pub mod seq2seq;
pub mod session;

pub use seq2seq::{EncoderInput, Generation, GenerationConfig, Seq2SeqModel};
pub use session::{build_cpu_session, input_names, load_tokenizer, locate, require_file};
