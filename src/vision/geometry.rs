// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detector output normalization
//!
//! Detectors report polygons (usually four corners) or rectangles, either in
//! absolute pixels or as ratios of the image size. Everything downstream works
//! on axis-aligned pixel rectangles, so the conversion lives here rather than
//! inside any particular detector.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A 2D point in detector coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Coordinate convention used by a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSpace {
    /// Pixel coordinates of the source image
    #[default]
    Absolute,
    /// Fractions of the image width/height (0.0-1.0)
    Ratio,
}

/// Raw detector output: a polygon with optional score and text
///
/// `text` is only populated by readers that detect and recognize in one
/// pass (the secondary pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub points: Vec<Point>,
    #[serde(default)]
    pub space: CoordinateSpace,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Detection {
    /// Polygon detection in absolute pixel coordinates
    pub fn polygon(points: Vec<Point>) -> Self {
        Self {
            points,
            space: CoordinateSpace::Absolute,
            confidence: None,
            text: None,
        }
    }

    /// Axis-aligned rectangle detection in absolute pixel coordinates
    pub fn rect(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self::polygon(vec![
            Point::new(x_min, y_min),
            Point::new(x_max, y_min),
            Point::new(x_max, y_max),
            Point::new(x_min, y_max),
        ])
    }

    pub fn in_ratio_space(mut self) -> Self {
        self.space = CoordinateSpace::Ratio;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Axis-aligned pixel rectangle, `x_max > x_min` and `y_max > y_min`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl PixelBox {
    /// Build a box, rejecting empty or inverted rectangles
    pub fn new(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Option<Self> {
        (x_max > x_min && y_max > y_min).then_some(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Vertical center
    pub fn center_y(&self) -> f32 {
        (self.y_min as f32 + self.y_max as f32) / 2.0
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Grow by `padding` on every side, clamped to the image
    pub fn expand(&self, padding: u32, image_width: u32, image_height: u32) -> Self {
        Self {
            x_min: self.x_min.saturating_sub(padding),
            y_min: self.y_min.saturating_sub(padding),
            x_max: self.x_max.saturating_add(padding).min(image_width),
            y_max: self.y_max.saturating_add(padding).min(image_height),
        }
    }
}

/// A pixel box together with what the detector said about it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub bbox: PixelBox,
    pub confidence: Option<f32>,
    pub text: Option<String>,
}

impl TextBox {
    pub fn new(bbox: PixelBox) -> Self {
        Self {
            bbox,
            confidence: None,
            text: None,
        }
    }
}

/// Filters applied while converting detections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Boxes with a smaller area (px²) are discarded
    pub min_area: u32,
    /// Boxes narrower or shorter than this (px) are noise
    pub min_side: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            min_area: 100,
            min_side: 5,
        }
    }
}

/// Convert one detection to a clamped pixel box
///
/// Returns `None` for polygons with fewer than two points, non-finite
/// coordinates, rectangles that collapse after clamping, and boxes under the
/// configured area or side minimums.
pub fn to_box(
    detection: &Detection,
    image_width: u32,
    image_height: u32,
    config: &GeometryConfig,
) -> Option<TextBox> {
    if detection.points.len() < 2 {
        debug!(
            "Skipping detection with {} point(s)",
            detection.points.len()
        );
        return None;
    }

    if detection
        .points
        .iter()
        .any(|p| !p.x.is_finite() || !p.y.is_finite())
    {
        debug!("Skipping detection with non-finite coordinates");
        return None;
    }

    let (scale_x, scale_y) = match detection.space {
        CoordinateSpace::Absolute => (1.0, 1.0),
        CoordinateSpace::Ratio => (image_width as f32, image_height as f32),
    };

    let (mut x_min, mut y_min) = (f32::INFINITY, f32::INFINITY);
    let (mut x_max, mut y_max) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in &detection.points {
        let x = p.x * scale_x;
        let y = p.y * scale_y;
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    let clamp = |v: f32, limit: u32| -> u32 { (v.trunc().max(0.0) as u32).min(limit) };
    let bbox = PixelBox::new(
        clamp(x_min, image_width),
        clamp(y_min, image_height),
        clamp(x_max, image_width),
        clamp(y_max, image_height),
    )?;

    if bbox.width() < config.min_side || bbox.height() < config.min_side {
        return None;
    }
    if bbox.area() < config.min_area as u64 {
        return None;
    }

    Some(TextBox {
        bbox,
        confidence: detection.confidence,
        text: detection.text.clone(),
    })
}

/// Convert a detector's output, dropping every degenerate detection
pub fn to_boxes(
    detections: &[Detection],
    image_width: u32,
    image_height: u32,
    config: &GeometryConfig,
) -> Vec<TextBox> {
    let boxes: Vec<TextBox> = detections
        .iter()
        .filter_map(|d| to_box(d, image_width, image_height, config))
        .collect();

    debug!(
        "Normalized {} detections into {} boxes",
        detections.len(),
        boxes.len()
    );
    boxes
}
