//! Image transform backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the whole surface the rest of the crate
//! needs from an image library: open a file into a working image, apply one
//! [`Operation`] to it, write it out. [`render`](super::render) strings the
//! three together for a pipeline.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) on top of the `image`
//! crate. Tests swap in a recording mock.

use super::operations::Operation;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image transform backends.
///
/// `apply` mutates the working image in place; operations are applied one
/// at a time in pipeline order.
pub trait ImageBackend: Sync {
    /// In-memory image being transformed.
    type Image;

    /// Decode the image at `path`.
    fn open(&self, path: &Path) -> Result<Self::Image, BackendError>;

    /// Apply a single operation.
    fn apply(&self, image: &mut Self::Image, op: &Operation) -> Result<(), BackendError>;

    /// Encode the image to `path`, replacing any existing file.
    fn write(&self, image: &Self::Image, path: &Path) -> Result<(), BackendError>;
}
