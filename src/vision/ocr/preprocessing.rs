// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tensor preparation for the detector and recognizers

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

/// Detector input side (square, padded)
pub const DETECTION_INPUT_SIZE: u32 = 640;

/// Printed recognizer input height
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Printed recognizer maximum input width
pub const REC_MAX_WIDTH: u32 = 960;

/// Handwriting recognizer input side
pub const HANDWRITING_INPUT_SIZE: u32 = 384;

/// ImageNet normalization used by the detector and printed recognizer
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Normalization used by the handwriting encoder
pub const HALF_MEAN: [f32; 3] = [0.5, 0.5, 0.5];
pub const HALF_STD: [f32; 3] = [0.5, 0.5, 0.5];

/// RGB image to a normalized `[1, 3, H, W]` tensor
pub fn to_nchw(rgb: &RgbImage, mean: [f32; 3], std: [f32; 3]) -> Array4<f32> {
    let (w, h) = rgb.dimensions();
    let mut tensor = Array4::zeros((1, 3, h as usize, w as usize));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - mean[c]) / std[c];
        }
    }
    tensor
}

/// Letterbox into the detector square and normalize
pub fn preprocess_for_detection(image: &DynamicImage) -> (Array4<f32>, PreprocessInfo) {
    let info = PreprocessInfo::new(image, DETECTION_INPUT_SIZE);
    let padded = resize_with_padding(image, DETECTION_INPUT_SIZE);
    (
        to_nchw(&padded.to_rgb8(), IMAGENET_MEAN, IMAGENET_STD),
        info,
    )
}

/// Fixed height, aspect-preserving width (clamped to `[4, REC_MAX_WIDTH]`)
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let scale = REC_INPUT_HEIGHT as f32 / h.max(1) as f32;
    let new_width = ((w as f32 * scale).round() as u32).clamp(4, REC_MAX_WIDTH);

    let resized = image
        .resize_exact(new_width, REC_INPUT_HEIGHT, FilterType::Lanczos3)
        .to_rgb8();
    to_nchw(&resized, IMAGENET_MEAN, IMAGENET_STD)
}

/// Square resize and `[-1, 1]` scaling for the handwriting encoder
pub fn preprocess_for_handwriting(image: &DynamicImage) -> Array4<f32> {
    let resized = image
        .resize_exact(
            HANDWRITING_INPUT_SIZE,
            HANDWRITING_INPUT_SIZE,
            FilterType::Triangle,
        )
        .to_rgb8();
    to_nchw(&resized, HALF_MEAN, HALF_STD)
}

/// Scale to fit a `target_size` square, centered on gray padding
pub fn resize_with_padding(image: &DynamicImage, target_size: u32) -> DynamicImage {
    let info = PreprocessInfo::new(image, target_size);
    let mut output = RgbImage::from_pixel(target_size, target_size, Rgb([128, 128, 128]));

    if info.original_width == 0 || info.original_height == 0 {
        return DynamicImage::ImageRgb8(output);
    }

    let resized = image
        .resize_exact(info.scaled_width, info.scaled_height, FilterType::Lanczos3)
        .to_rgb8();
    image::imageops::replace(
        &mut output,
        &resized,
        info.offset_x as i64,
        info.offset_y as i64,
    );
    DynamicImage::ImageRgb8(output)
}

/// Letterbox geometry, for mapping detector output back to the source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessInfo {
    pub scale: f32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl PreprocessInfo {
    pub fn new(image: &DynamicImage, target_size: u32) -> Self {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Self {
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                scaled_width: 0,
                scaled_height: 0,
                original_width: w,
                original_height: h,
            };
        }

        let scale = (target_size as f32 / w as f32).min(target_size as f32 / h as f32);
        let scaled_width = ((w as f32 * scale).round() as u32).clamp(1, target_size);
        let scaled_height = ((h as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            offset_x: (target_size - scaled_width) / 2,
            offset_y: (target_size - scaled_height) / 2,
            scaled_width,
            scaled_height,
            original_width: w,
            original_height: h,
        }
    }

    /// Detector-input coordinates to source-image coordinates
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.offset_x as f32) / self.scale,
            (y - self.offset_y as f32) / self.scale,
        )
    }
}
