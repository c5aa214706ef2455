// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Printed vs handwritten classification
//!
//! Two deterministic strategies:
//! - `Pixel`: each enabled image feature casts one vote per crop; a crop is
//!   printed when printed votes strictly outnumber handwritten ones, and the
//!   document label is the majority over crops (ties go to printed).
//! - `Confidence`: when the printed recognizer's mean confidence is below the
//!   cutoff and the handwriting recognizer produced text, the document is
//!   handwritten.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::{gaussian_blur_f32, laplacian_filter};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::crop::Crop;

/// Document or line text type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextType {
    Printed,
    Handwritten,
}

impl TextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextType::Printed => "Printed",
            TextType::Handwritten => "Handwritten",
        }
    }
}

impl fmt::Display for TextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller's text type request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTypeHint {
    #[default]
    Auto,
    Printed,
    Handwritten,
}

impl FromStr for TextTypeHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(Self::Auto),
            "printed" => Ok(Self::Printed),
            "handwritten" => Ok(Self::Handwritten),
            other => Err(format!(
                "Invalid text_type '{}': expected auto, printed or handwritten",
                other
            )),
        }
    }
}

/// How `auto` requests decide the text type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTypeStrategy {
    /// Run both recognizers and compare printed confidence with the cutoff
    #[default]
    Confidence,
    /// Vote over pixel features of each crop before recognition
    Pixel,
}

impl FromStr for TextTypeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confidence" => Ok(Self::Confidence),
            "pixel" => Ok(Self::Pixel),
            other => Err(format!("Unknown text type strategy '{}'", other)),
        }
    }
}

/// Image features that can vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFeature {
    /// Mean Sobel magnitude of the lightly blurred crop
    EdgeStrength,
    /// Variance of the Laplacian
    LaplacianVariance,
    /// Mean Sobel magnitude of the raw crop
    GradientEnergy,
    /// Connected components after Otsu binarization
    ConnectedComponents,
    /// Circular variance of edge orientations
    DirectionVariance,
}

/// Thresholds; a value above (or, for direction variance, below) its
/// threshold votes printed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureThresholds {
    pub edge_strength: f32,
    pub laplacian_variance: f32,
    pub gradient_energy: f32,
    pub connected_components: u32,
    pub direction_variance: f32,
}

impl Default for FeatureThresholds {
    fn default() -> Self {
        Self {
            edge_strength: 108.0,
            laplacian_variance: 1800.0,
            gradient_energy: 165.0,
            connected_components: 120,
            direction_variance: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub strategy: TextTypeStrategy,
    /// Features that vote under the pixel strategy
    pub features: Vec<PixelFeature>,
    pub thresholds: FeatureThresholds,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            strategy: TextTypeStrategy::default(),
            features: vec![
                PixelFeature::EdgeStrength,
                PixelFeature::LaplacianVariance,
                PixelFeature::GradientEnergy,
            ],
            thresholds: FeatureThresholds::default(),
        }
    }
}

/// Raw feature values for one image
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureMeasurements {
    pub edge_strength: f32,
    pub laplacian_variance: f32,
    pub gradient_energy: f32,
    pub connected_components: u32,
    pub direction_variance: f32,
}

/// Feature-threshold classifier
#[derive(Debug, Clone, Default)]
pub struct TextTypeClassifier {
    config: ClassifierConfig,
}

impl TextTypeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn strategy(&self) -> TextTypeStrategy {
        self.config.strategy
    }

    /// Compute every feature for an image
    pub fn measure(&self, image: &DynamicImage) -> FeatureMeasurements {
        let gray = image.to_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return FeatureMeasurements::default();
        }

        let blurred = gaussian_blur_f32(&gray, 0.8);
        let (edge_strength, _) = sobel_stats(&blurred);
        let (gradient_energy, direction_variance) = sobel_stats(&gray);

        FeatureMeasurements {
            edge_strength,
            laplacian_variance: laplacian_variance(&gray),
            gradient_energy,
            connected_components: component_count(&gray),
            direction_variance,
        }
    }

    /// One vote per enabled feature
    pub fn votes(&self, m: &FeatureMeasurements) -> Vec<TextType> {
        let t = &self.config.thresholds;
        self.config
            .features
            .iter()
            .map(|feature| {
                let printed = match feature {
                    PixelFeature::EdgeStrength => m.edge_strength > t.edge_strength,
                    PixelFeature::LaplacianVariance => {
                        m.laplacian_variance > t.laplacian_variance
                    }
                    PixelFeature::GradientEnergy => m.gradient_energy > t.gradient_energy,
                    PixelFeature::ConnectedComponents => {
                        m.connected_components > t.connected_components
                    }
                    PixelFeature::DirectionVariance => {
                        m.direction_variance < t.direction_variance
                    }
                };
                if printed {
                    TextType::Printed
                } else {
                    TextType::Handwritten
                }
            })
            .collect()
    }

    /// Label a single image: printed only on a strict printed majority
    pub fn classify_image(&self, image: &DynamicImage) -> TextType {
        let m = self.measure(image);
        let votes = self.votes(&m);
        let printed = votes.iter().filter(|v| **v == TextType::Printed).count();
        let label = if printed > votes.len() - printed {
            TextType::Printed
        } else {
            TextType::Handwritten
        };
        tracing::debug!(
            "Pixel features edge={:.1} lap_var={:.1} grad={:.1} cc={} dir_var={:.3} -> {}",
            m.edge_strength,
            m.laplacian_variance,
            m.gradient_energy,
            m.connected_components,
            m.direction_variance,
            label
        );
        label
    }

    /// Document label over all crops
    pub fn classify_crops(&self, crops: &[Crop]) -> TextType {
        let labels: Vec<TextType> = crops.iter().map(|c| self.classify_image(&c.image)).collect();
        majority(&labels)
    }
}

/// Majority label; ties (and empty input) go to printed
pub fn majority(labels: &[TextType]) -> TextType {
    let printed = labels.iter().filter(|l| **l == TextType::Printed).count();
    if printed >= labels.len() - printed {
        TextType::Printed
    } else {
        TextType::Handwritten
    }
}

/// Confidence strategy decision
///
/// `mean_confidence` is the printed recognizer's mean line confidence, or
/// `None` when it produced nothing scoreable.
pub fn classify_by_confidence(
    mean_confidence: Option<f32>,
    handwriting_nonempty: bool,
    cutoff: f32,
) -> TextType {
    let low = mean_confidence.map_or(true, |c| c < cutoff);
    if low && handwriting_nonempty {
        TextType::Handwritten
    } else {
        TextType::Printed
    }
}

/// Mean Sobel magnitude and circular variance of edge orientation
fn sobel_stats(gray: &GrayImage) -> (f32, f32) {
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);

    let mut sum = 0.0f64;
    let (mut cos_sum, mut sin_sum, mut strong) = (0.0f64, 0.0f64, 0usize);

    for (px, py) in gx.pixels().zip(gy.pixels()) {
        let (x, y) = (px[0] as f64, py[0] as f64);
        let mag = (x * x + y * y).sqrt();
        sum += mag;
        if mag > 1e-6 {
            // Doubled angle so opposite edges of one stroke agree
            let theta = 2.0 * y.atan2(x);
            cos_sum += theta.cos();
            sin_sum += theta.sin();
            strong += 1;
        }
    }

    let n = (gray.width() * gray.height()) as f64;
    let mean = (sum / n) as f32;
    let direction_variance = if strong == 0 {
        0.0
    } else {
        let r = (cos_sum * cos_sum + sin_sum * sin_sum).sqrt() / strong as f64;
        (1.0 - r) as f32
    };
    (mean, direction_variance)
}

fn laplacian_variance(gray: &GrayImage) -> f32 {
    let lap = laplacian_filter(gray);
    let n = (lap.width() * lap.height()) as f64;
    let mean = lap.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
    let var = lap
        .pixels()
        .map(|p| {
            let d = p[0] as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    var as f32
}

/// Dark-ink components after Otsu binarization
fn component_count(gray: &GrayImage) -> u32 {
    let level = otsu_level(gray);
    let ink = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] <= level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });
    let labels = connected_components(&ink, Connectivity::Eight, Luma([0u8]));
    labels.pixels().map(|p| p[0]).max().unwrap_or(0)
}
