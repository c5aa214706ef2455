// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! DB-style text detector
//!
//! The model outputs a per-pixel text probability map. Regions above the
//! threshold are flood-filled, expanded by the DB unclip offset, and mapped
//! back through the letterbox to source-image pixels. Coordinate mapping is
//! done here so callers always receive absolute `Detection`s.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{Array2, ArrayViewD};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::{preprocess_for_detection, PreprocessInfo, DETECTION_INPUT_SIZE};
use super::TextDetector;
use crate::inference::{build_cpu_session, input_names};
use crate::vision::geometry::Detection;

/// Probability above which a pixel counts as text
pub const DEFAULT_PROB_THRESHOLD: f32 = 0.3;

/// Regions with fewer pixels are noise
pub const MIN_REGION_PIXELS: usize = 10;

/// DB unclip ratio
pub const DEFAULT_UNCLIP_RATIO: f32 = 1.5;

/// A connected text region in probability-map coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub min_x: usize,
    pub max_x: usize,
    pub min_y: usize,
    pub max_y: usize,
    pub pixels: usize,
    pub mean_probability: f32,
}

/// ONNX text detector
#[derive(Clone)]
pub struct OnnxTextDetector {
    session: Arc<Mutex<Session>>,
    input_name: String,
    prob_threshold: f32,
    unclip_ratio: f32,
}

impl std::fmt::Debug for OnnxTextDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxTextDetector")
            .field("input_name", &self.input_name)
            .field("prob_threshold", &self.prob_threshold)
            .field("unclip_ratio", &self.unclip_ratio)
            .finish_non_exhaustive()
    }
}

impl OnnxTextDetector {
    /// Load `det_model.onnx`
    pub fn new(model_path: &Path) -> Result<Self> {
        info!("Loading text detector from {}", model_path.display());
        let session = build_cpu_session(model_path, "Text detection model")?;
        let input_name = input_names(&session)
            .into_iter()
            .next()
            .unwrap_or_else(|| "x".to_string());

        info!("✅ Text detector loaded (CPU-only)");
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            prob_threshold: DEFAULT_PROB_THRESHOLD,
            unclip_ratio: DEFAULT_UNCLIP_RATIO,
        })
    }

    pub fn with_prob_threshold(mut self, threshold: f32) -> Self {
        self.prob_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    fn probability_map(&self, image: &DynamicImage) -> Result<(Array2<f32>, PreprocessInfo)> {
        let (tensor, info) = preprocess_for_detection(image);
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detector session lock poisoned"))?;

        let input = Value::from_array(tensor).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .context("Detection inference failed")?;
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract probability map")?;

        Ok((squeeze_map(output)?, info))
    }
}

impl TextDetector for OnnxTextDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let (map, info) = self.probability_map(image)?;
        let (map_h, map_w) = map.dim();
        // The map may be downsampled relative to the detector input
        let sx = DETECTION_INPUT_SIZE as f32 / map_w.max(1) as f32;
        let sy = DETECTION_INPUT_SIZE as f32 / map_h.max(1) as f32;

        let regions = find_regions(&map, self.prob_threshold);
        debug!("Probability map {}x{}: {} regions", map_w, map_h, regions.len());

        let detections = regions
            .iter()
            .map(|r| {
                let (x0, y0, x1, y1) = unclip(r, self.unclip_ratio);
                let (ax, ay) = info.map_to_original(x0 * sx, y0 * sy);
                let (bx, by) = info.map_to_original(x1 * sx, y1 * sy);
                Detection::rect(ax, ay, bx, by).with_confidence(r.mean_probability)
            })
            .collect();
        Ok(detections)
    }
}

/// Accept `[1, 1, H, W]`, `[1, H, W]` or `[H, W]`
fn squeeze_map(output: ArrayViewD<f32>) -> Result<Array2<f32>> {
    let shape = output.shape().to_vec();
    let (h, w) = match shape.as_slice() {
        [1, 1, h, w] | [1, h, w] | [h, w] => (*h, *w),
        other => anyhow::bail!("Unexpected probability map shape: {:?}", other),
    };
    Ok(output
        .to_shape((h, w))
        .context("Failed to reshape probability map")?
        .into_owned())
}

/// 4-connected regions at or above `threshold`
pub fn find_regions(map: &Array2<f32>, threshold: f32) -> Vec<Region> {
    let (height, width) = map.dim();
    let mut visited = vec![false; height * width];
    let mut regions = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if visited[y * width + x] || map[[y, x]] < threshold {
                continue;
            }

            let mut region = Region {
                min_x: x,
                max_x: x,
                min_y: y,
                max_y: y,
                pixels: 0,
                mean_probability: 0.0,
            };
            let mut sum = 0.0f32;
            let mut stack = vec![(x, y)];

            while let Some((cx, cy)) = stack.pop() {
                let idx = cy * width + cx;
                if visited[idx] || map[[cy, cx]] < threshold {
                    continue;
                }
                visited[idx] = true;
                region.pixels += 1;
                sum += map[[cy, cx]];
                region.min_x = region.min_x.min(cx);
                region.max_x = region.max_x.max(cx);
                region.min_y = region.min_y.min(cy);
                region.max_y = region.max_y.max(cy);

                if cx > 0 {
                    stack.push((cx - 1, cy));
                }
                if cx + 1 < width {
                    stack.push((cx + 1, cy));
                }
                if cy > 0 {
                    stack.push((cx, cy - 1));
                }
                if cy + 1 < height {
                    stack.push((cx, cy + 1));
                }
            }

            if region.pixels >= MIN_REGION_PIXELS {
                region.mean_probability = sum / region.pixels as f32;
                regions.push(region);
            }
        }
    }

    regions
}

/// Expand a shrunk DB region by `area * ratio / perimeter`
pub fn unclip(region: &Region, ratio: f32) -> (f32, f32, f32, f32) {
    let w = (region.max_x - region.min_x + 1) as f32;
    let h = (region.max_y - region.min_y + 1) as f32;
    let d = w * h * ratio / (2.0 * (w + h));
    (
        region.min_x as f32 - d,
        region.min_y as f32 - d,
        region.max_x as f32 + 1.0 + d,
        region.max_y as f32 + 1.0 + d,
    )
}
