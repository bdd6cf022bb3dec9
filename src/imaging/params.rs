//! Parameter types for image operations.
//!
//! These structs describe *what* an operation should do, parsed from the
//! string or number a preset gives it. The [`operations`](super::operations)
//! registry turns config values into these, and the
//! [`backend`](super::backend) does the pixel work.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Sharpening`]: Unsharp-mask parameters (sigma + threshold).
//! - [`Geometry`]: ImageMagick-style resize geometry (`100x100`, `50%`, `800x>`).
//! - [`CropGeometry`]: Crop rectangle (`WxH+X+Y`).
//! - [`Rotation`]: Quarter-turn rotations.
//! - [`OutputFormat`]: Encoding of the written image.

use image::ImageFormat;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A config argument that could not be parsed into a parameter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} '{value}' (expected {expected})")]
pub struct ParamError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParamError {
    pub(crate) fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening, used for `sharpen = true`.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

impl FromStr for Sharpening {
    type Err = ParamError;

    /// Accepts `"SIGMA"` or `"SIGMAxTHRESHOLD"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParamError::new("sharpening", s, "SIGMA or SIGMAxTHRESHOLD");
        let (sigma, threshold) = match s.trim().split_once(['x', 'X']) {
            Some((sigma, threshold)) => (sigma, Some(threshold)),
            None => (s.trim(), None),
        };
        let sigma: f32 = sigma.parse().map_err(|_| err())?;
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(err());
        }
        let threshold = match threshold {
            Some(t) => t.parse().map_err(|_| err())?,
            None => 0,
        };
        Ok(Self { sigma, threshold })
    }
}

/// How a box geometry maps the source onto the target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// Largest size that fits inside the box, aspect preserved.
    Fit,
    /// Smallest size that covers the box, aspect preserved (`^`).
    Fill,
    /// Exactly the given dimensions, aspect ignored (`!`).
    Exact,
}

/// Target size of a geometry, before the mode is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySize {
    /// `WxH`, `Wx`, `xH` or a bare `W`. At least one side is set.
    Box {
        width: Option<u32>,
        height: Option<u32>,
    },
    /// `N%` of the source size.
    Percent(u32),
}

/// Resize geometry in ImageMagick notation.
///
/// ```text
/// 100x100    fit inside 100x100
/// 100x100^   cover 100x100
/// 100x100!   exactly 100x100
/// 800x>      shrink to 800 wide, never enlarge
/// 50%        half size
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub size: GeometrySize,
    pub mode: ResizeMode,
    pub only_shrink: bool,
    pub only_enlarge: bool,
}

const GEOMETRY_EXPECTED: &str = "WxH, Wx, xH or N%, optionally followed by ^ ! > or <";

impl FromStr for Geometry {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParamError::new("geometry", s, GEOMETRY_EXPECTED);
        let trimmed = s.trim();
        let body = trimmed.trim_end_matches(['^', '!', '>', '<']);
        let flags = &trimmed[body.len()..];

        let only_shrink = flags.contains('>');
        let only_enlarge = flags.contains('<');
        if only_shrink && only_enlarge {
            return Err(err());
        }
        let mode = if flags.contains('!') {
            ResizeMode::Exact
        } else if flags.contains('^') {
            ResizeMode::Fill
        } else {
            ResizeMode::Fit
        };

        let size = if let Some(pct) = body.strip_suffix('%') {
            match pct.parse::<u32>() {
                Ok(p) if p > 0 => GeometrySize::Percent(p),
                _ => return Err(err()),
            }
        } else {
            let (w, h) = body.split_once(['x', 'X']).unwrap_or((body, ""));
            let parse_side = |side: &str| -> Result<Option<u32>, ParamError> {
                if side.is_empty() {
                    return Ok(None);
                }
                match side.parse::<u32>() {
                    Ok(v) if v > 0 => Ok(Some(v)),
                    _ => Err(err()),
                }
            };
            let width = parse_side(w)?;
            let height = parse_side(h)?;
            if width.is_none() && height.is_none() {
                return Err(err());
            }
            GeometrySize::Box { width, height }
        };

        Ok(Self {
            size,
            mode,
            only_shrink,
            only_enlarge,
        })
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size {
            GeometrySize::Percent(p) => write!(f, "{p}%")?,
            GeometrySize::Box { width, height } => {
                if let Some(w) = width {
                    write!(f, "{w}")?;
                }
                f.write_str("x")?;
                if let Some(h) = height {
                    write!(f, "{h}")?;
                }
            }
        }
        match self.mode {
            ResizeMode::Fit => {}
            ResizeMode::Fill => f.write_str("^")?,
            ResizeMode::Exact => f.write_str("!")?,
        }
        if self.only_shrink {
            f.write_str(">")?;
        }
        if self.only_enlarge {
            f.write_str("<")?;
        }
        Ok(())
    }
}

/// Crop rectangle: `WxH` anchored at the top-left, or `WxH+X+Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropGeometry {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl FromStr for CropGeometry {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParamError::new("crop geometry", s, "WxH or WxH+X+Y");
        let mut parts = s.trim().split('+');
        let dims = parts.next().ok_or_else(err)?;
        let (w, h) = dims.split_once(['x', 'X']).ok_or_else(err)?;
        let width: u32 = w.parse().map_err(|_| err())?;
        let height: u32 = h.parse().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(err());
        }
        let x = match parts.next() {
            Some(v) => v.parse().map_err(|_| err())?,
            None => 0,
        };
        let y = match parts.next() {
            Some(v) => v.parse().map_err(|_| err())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Self {
            width,
            height,
            x,
            y,
        })
    }
}

impl fmt::Display for CropGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Clockwise quarter-turn rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Normalize degrees to a quarter turn. `Ok(None)` for full turns.
    pub fn from_degrees(degrees: i64) -> Result<Option<Self>, ParamError> {
        match degrees.rem_euclid(360) {
            0 => Ok(None),
            90 => Ok(Some(Self::Cw90)),
            180 => Ok(Some(Self::Cw180)),
            270 => Ok(Some(Self::Cw270)),
            _ => Err(ParamError::new(
                "rotation",
                &degrees.to_string(),
                "a multiple of 90 degrees",
            )),
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::Cw90 => 90,
            Self::Cw180 => 180,
            Self::Cw270 => 270,
        }
    }
}

/// Encoding used when writing the transformed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
}

impl OutputFormat {
    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
            Self::WebP => ImageFormat::WebP,
        }
    }

    /// Map a decoder-reported format back to one we can encode.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::WebP),
            _ => Err(ParamError::new("format", s, "png, jpg, jpeg, gif or webp")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::WebP => "webp",
        })
    }
}
