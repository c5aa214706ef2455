// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-request scratch directory
//!
//! Holds the uploaded image and, optionally, the line crops. The directory
//! is removed when the value is dropped, on success and error alike.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::vision::crop::Crop;
use crate::vision::image_utils::encode_png;

#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("ocr-request-").tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the raw upload as `upload.{extension}`
    pub fn store_upload(&self, bytes: &[u8], extension: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(format!("upload.{}", extension));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Write each crop as `line_{index}.png`
    pub fn store_crops(&self, crops: &[Crop]) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(crops.len());
        for (i, crop) in crops.iter().enumerate() {
            let png = encode_png(&crop.image)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            let path = self.dir.path().join(format!("line_{:03}.png", i));
            std::fs::write(&path, png)?;
            paths.push(path);
        }
        Ok(paths)
    }
}
