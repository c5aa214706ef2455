// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module
//!
//! This module provides:
//! - Detector output normalization into pixel boxes (`geometry`)
//! - Text-line grouping and ordering (`lines`)
//! - Owned line crops for recognizers (`crop`)
//! - Printed vs handwritten classification (`classifier`)
//! - Language guessing and the language-code table (`language`)
//! - ONNX-backed detector and recognizers (`ocr`)
//!
//! Models run on CPU; inference calls are blocking.

pub mod classifier;
pub mod crop;
pub mod geometry;
pub mod image_utils;
pub mod language;
pub mod lines;
pub mod model_manager;
pub mod ocr;

pub use classifier::{TextType, TextTypeClassifier};
pub use crop::{crop, Crop};
pub use geometry::{to_box, CoordinateSpace, Detection, GeometryConfig, PixelBox, Point, TextBox};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use language::{LanguageCodes, LanguageGuesser};
pub use lines::{group_lines, single_line, Line, LineSeparation};
pub use model_manager::{VisionModelInfo, VisionModelManager};
