//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CropGeometry, Geometry, GeometrySize, ResizeMode};

fn scaled(side: u32, factor: f64) -> u32 {
    ((side as f64 * factor).round() as u32).max(1)
}

/// Calculate the output dimensions of a resize.
///
/// Returns `None` when the geometry's `>` / `<` guard says the image should
/// be left alone.
///
/// # Examples
/// ```
/// # use image_presets::imaging::calculate_resize_dimensions;
/// let fit = "100x100".parse().unwrap();
/// assert_eq!(calculate_resize_dimensions((400, 200), &fit), Some((100, 50)));
///
/// let shrink_only = "800x>".parse().unwrap();
/// assert_eq!(calculate_resize_dimensions((640, 480), &shrink_only), None);
/// ```
pub fn calculate_resize_dimensions(source: (u32, u32), geometry: &Geometry) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return None;
    }

    let target = match geometry.size {
        GeometrySize::Percent(p) => {
            let factor = p as f64 / 100.0;
            (scaled(src_w, factor), scaled(src_h, factor))
        }
        GeometrySize::Box { width, height } => {
            let sx = width.map(|w| w as f64 / src_w as f64);
            let sy = height.map(|h| h as f64 / src_h as f64);
            match (geometry.mode, sx, sy) {
                (ResizeMode::Exact, _, _) => (width.unwrap_or(src_w), height.unwrap_or(src_h)),
                (ResizeMode::Fit, Some(sx), Some(sy)) => {
                    let f = sx.min(sy);
                    (scaled(src_w, f), scaled(src_h, f))
                }
                (ResizeMode::Fill, Some(sx), Some(sy)) => {
                    let f = sx.max(sy);
                    (scaled(src_w, f), scaled(src_h, f))
                }
                // One side given: scale to it, whatever the mode
                (_, Some(f), None) | (_, None, Some(f)) => (scaled(src_w, f), scaled(src_h, f)),
                (_, None, None) => return None,
            }
        }
    };

    if geometry.only_shrink && target.0 >= src_w && target.1 >= src_h {
        return None;
    }
    if geometry.only_enlarge && target.0 <= src_w && target.1 <= src_h {
        return None;
    }
    Some(target)
}

/// Clamp a crop rectangle to the source image.
///
/// Returns `(x, y, width, height)`, or `None` when the offset lies entirely
/// outside the image.
pub fn calculate_crop_rect(source: (u32, u32), crop: &CropGeometry) -> Option<(u32, u32, u32, u32)> {
    let (src_w, src_h) = source;
    if crop.x >= src_w || crop.y >= src_h {
        return None;
    }
    let width = crop.width.min(src_w - crop.x);
    let height = crop.height.min(src_h - crop.y);
    Some((crop.x, crop.y, width, height))
}
