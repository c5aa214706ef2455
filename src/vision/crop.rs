// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Line crops
//!
//! A `Crop` owns its pixels so the source image can be dropped or reused
//! while recognizers work on the crop.

use image::{imageops::FilterType, DynamicImage, GenericImageView};

use super::geometry::PixelBox;

/// Crops this short or shorter are rejected
pub const MIN_CROP_HEIGHT: u32 = 20;
/// Crops this narrow or narrower are rejected
pub const MIN_CROP_WIDTH: u32 = 40;

/// An owned sub-image and the region it was cut from
#[derive(Debug, Clone)]
pub struct Crop {
    pub image: DynamicImage,
    /// Padded, clamped region in source coordinates
    pub bbox: PixelBox,
}

impl Crop {
    /// The full image as a single crop (no size floor applied)
    pub fn whole(image: &DynamicImage) -> Option<Self> {
        let bbox = PixelBox::new(0, 0, image.width(), image.height())?;
        Some(Self {
            image: image.clone(),
            bbox,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// RGB copy resized to a recognizer's fixed input size
    pub fn resized(&self, width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(
            self.image
                .resize_exact(width, height, FilterType::Triangle)
                .to_rgb8(),
        )
    }
}

/// Cut `bbox` expanded by `padding` out of `image`
///
/// Returns `None` when the padded, clamped region is at most 20px tall or
/// at most 40px wide.
pub fn crop(image: &DynamicImage, bbox: &PixelBox, padding: u32) -> Option<Crop> {
    let (img_w, img_h) = image.dimensions();
    let region = bbox.expand(padding, img_w, img_h);

    if region.x_max <= region.x_min || region.y_max <= region.y_min {
        return None;
    }
    if region.height() <= MIN_CROP_HEIGHT || region.width() <= MIN_CROP_WIDTH {
        tracing::debug!(
            "Rejecting {}x{} crop at ({}, {})",
            region.width(),
            region.height(),
            region.x_min,
            region.y_min
        );
        return None;
    }

    let pixels = image.crop_imm(region.x_min, region.y_min, region.width(), region.height());
    Some(Crop {
        image: pixels,
        bbox: region,
    })
}
