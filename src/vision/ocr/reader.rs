// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detector and recognizer combined into a single-pass page reader

use anyhow::Result;
use image::DynamicImage;
use std::sync::Arc;
use tracing::debug;

use super::{LineRecognizer, PageReader, TextDetector};
use crate::vision::crop::Crop;
use crate::vision::geometry::{to_box, Detection, GeometryConfig};

/// Reads every detected region with one recognizer
///
/// Regions are cut without padding or size floor, so short words still
/// get read. Each returned detection carries its text and the recognizer
/// confidence.
pub struct DetectRecognizeReader {
    detector: Arc<dyn TextDetector>,
    recognizer: Arc<dyn LineRecognizer>,
    geometry: GeometryConfig,
}

impl DetectRecognizeReader {
    pub fn new(detector: Arc<dyn TextDetector>, recognizer: Arc<dyn LineRecognizer>) -> Self {
        Self {
            detector,
            recognizer,
            geometry: GeometryConfig::default(),
        }
    }
}

impl PageReader for DetectRecognizeReader {
    fn read(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let detections = self.detector.detect(image)?;
        let (w, h) = (image.width(), image.height());

        let mut read = Vec::with_capacity(detections.len());
        for detection in &detections {
            let Some(tb) = to_box(detection, w, h, &self.geometry) else {
                continue;
            };
            let region = image.crop_imm(
                tb.bbox.x_min,
                tb.bbox.y_min,
                tb.bbox.width(),
                tb.bbox.height(),
            );
            let crop = Crop {
                image: region,
                bbox: tb.bbox,
            };
            let recognition = self.recognizer.recognize(&crop)?;
            if recognition.is_empty() {
                continue;
            }
            read.push(
                Detection::rect(
                    tb.bbox.x_min as f32,
                    tb.bbox.y_min as f32,
                    tb.bbox.x_max as f32,
                    tb.bbox.y_max as f32,
                )
                .with_text(recognition.text)
                .with_confidence(recognition.confidence),
            );
        }

        debug!("Page reader produced {} text regions", read.len());
        Ok(read)
    }
}
