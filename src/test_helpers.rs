//! Shared test utilities.
//!
//! Fixture builders for site trees and real image files, plus preset
//! construction without going through TOML.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_test_png(&tmp.path().join("images/a.png"), 40, 20);
//! let p = preset("thumbs", "images", "generated/thumbs", vec![]);
//! ```

use crate::config::Preset;
use crate::imaging::{Operation, Pipeline};
use image::{ImageBuffer, Rgb, RgbImage};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

// =========================================================================
// Files
// =========================================================================

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Set a file's modification time. Panics on failure.
pub fn set_mtime(path: &Path, mtime: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(mtime))
        .unwrap_or_else(|e| panic!("set_mtime {}: {e}", path.display()));
}

// =========================================================================
// Images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

/// Write a small gradient PNG, creating parent directories.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Write a small gradient JPEG, creating parent directories.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

// =========================================================================
// Presets
// =========================================================================

/// Build a preset directly from its parts.
pub fn preset(name: &str, source: &str, destination: &str, operations: Vec<Operation>) -> Preset {
    Preset {
        name: name.to_string(),
        source: PathBuf::from(source),
        destination: PathBuf::from(destination),
        pipeline: Arc::new(Pipeline::new(operations)),
    }
}
