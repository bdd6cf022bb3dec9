//! Image transforms in pure Rust, no ImageMagick.
//!
//! | Concern | Where |
//! |---|---|
//! | **Capability** | [`ImageBackend`]: open, apply one operation, write |
//! | **Registry** | [`Operation`] / [`Pipeline`]: the closed set of preset steps |
//! | **Parameters** | geometry, crop, rotation, quality, format parsing |
//! | **Calculations** | resize and crop math (unit testable) |
//! | **Production backend** | [`RustBackend`] on the `image` crate |

pub mod backend;
mod calculations;
pub mod operations;
pub mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{calculate_crop_rect, calculate_resize_dimensions};
pub use operations::{OPERATION_NAMES, Operation, OperationError, Pipeline, render};
pub use params::{CropGeometry, Geometry, OutputFormat, ParamError, Quality, Rotation, Sharpening};
pub use rust_backend::{RustBackend, SUPPORTED_EXTENSIONS, WorkingImage};
