//! Pure Rust image backend on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF, WebP) | `image::ImageReader` with format sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3`, dimensions from [`calculate_resize_dimensions`] |
//! | Crop | `DynamicImage::crop_imm` |
//! | Rotate / flip / flop | `rotate90`/`rotate180`/`rotate270`, `flipv`, `fliph` |
//! | Grayscale | `DynamicImage::grayscale` |
//! | Blur / sharpen | `DynamicImage::blur`, `DynamicImage::unsharpen` |
//! | Encode JPEG | `JpegEncoder::new_with_quality` |
//! | Encode PNG / GIF / WebP | `DynamicImage::write_to` |
//!
//! The written format is the pipeline's `format` step if it has one,
//! otherwise the format the source was decoded from, otherwise whatever the
//! output file extension says.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{calculate_crop_rect, calculate_resize_dimensions};
use super::operations::Operation;
use super::params::{OutputFormat, Quality, Rotation};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Extensions the scanner hands to this backend.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// An image mid-pipeline: pixels plus the encoding settings collected so far.
#[derive(Debug, Clone)]
pub struct WorkingImage {
    pub pixels: DynamicImage,
    /// Format the source was decoded from.
    pub source_format: Option<ImageFormat>,
    /// Explicit `format` step, if any.
    pub output_format: Option<OutputFormat>,
    pub quality: Quality,
}

impl WorkingImage {
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            source_format: None,
            output_format: None,
            quality: Quality::default(),
        }
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.pixels.width(), self.pixels.height())
    }

    /// Resolve the encoding for `path`.
    fn encoding_for(&self, path: &Path) -> Result<OutputFormat, BackendError> {
        if let Some(format) = self.output_format {
            return Ok(format);
        }
        if let Some(format) = self.source_format.and_then(OutputFormat::from_image_format) {
            return Ok(format);
        }
        ImageFormat::from_path(path)
            .ok()
            .and_then(OutputFormat::from_image_format)
            .ok_or_else(|| {
                BackendError::ProcessingFailed(format!(
                    "Cannot determine output format for {}",
                    path.display()
                ))
            })
    }
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    type Image = WorkingImage;

    fn open(&self, path: &Path) -> Result<WorkingImage, BackendError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let source_format = reader.format();
        let pixels = reader.decode().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })?;
        Ok(WorkingImage {
            source_format,
            ..WorkingImage::new(pixels)
        })
    }

    fn apply(&self, image: &mut WorkingImage, op: &Operation) -> Result<(), BackendError> {
        match op {
            Operation::Resize(geometry) => {
                if let Some((w, h)) = calculate_resize_dimensions(image.dimensions(), geometry) {
                    image.pixels = image.pixels.resize_exact(w, h, FilterType::Lanczos3);
                }
            }
            Operation::Crop(crop) => {
                let (x, y, w, h) =
                    calculate_crop_rect(image.dimensions(), crop).ok_or_else(|| {
                        BackendError::ProcessingFailed(format!(
                            "Crop {} lies outside the {}x{} image",
                            crop,
                            image.pixels.width(),
                            image.pixels.height()
                        ))
                    })?;
                image.pixels = image.pixels.crop_imm(x, y, w, h);
            }
            Operation::Rotate(rotation) => {
                image.pixels = match rotation {
                    Rotation::Cw90 => image.pixels.rotate90(),
                    Rotation::Cw180 => image.pixels.rotate180(),
                    Rotation::Cw270 => image.pixels.rotate270(),
                };
            }
            Operation::Flip => image.pixels = image.pixels.flipv(),
            Operation::Flop => image.pixels = image.pixels.fliph(),
            Operation::Grayscale => image.pixels = image.pixels.grayscale(),
            Operation::Blur(sigma) => image.pixels = image.pixels.blur(*sigma),
            Operation::Sharpen(s) => image.pixels = image.pixels.unsharpen(s.sigma, s.threshold),
            Operation::Quality(quality) => image.quality = *quality,
            Operation::Format(format) => image.output_format = Some(*format),
        }
        Ok(())
    }

    fn write(&self, image: &WorkingImage, path: &Path) -> Result<(), BackendError> {
        let format = image.encoding_for(path)?;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let encoded = match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(image.pixels.to_rgb8());
                let encoder =
                    JpegEncoder::new_with_quality(&mut writer, image.quality.value() as u8);
                rgb.write_with_encoder(encoder)
            }
            OutputFormat::WebP => {
                // The pure Rust WebP encoder is lossless and wants 8-bit RGB(A)
                DynamicImage::ImageRgba8(image.pixels.to_rgba8())
                    .write_to(&mut writer, ImageFormat::WebP)
            }
            OutputFormat::Gif => DynamicImage::ImageRgba8(image.pixels.to_rgba8())
                .write_to(&mut writer, ImageFormat::Gif),
            OutputFormat::Png => image.pixels.write_to(&mut writer, ImageFormat::Png),
        };
        encoded.map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to encode {} as {}: {}",
                path.display(),
                format,
                e
            ))
        })?;
        writer.flush()?;
        Ok(())
    }
}
