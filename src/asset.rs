//! One source image bound to one preset.
//!
//! A [`DerivedAsset`] knows three paths for its image and decides, each time
//! it is asked to [`materialize`](DerivedAsset::materialize), how much work
//! that takes:
//!
//! ```text
//! source       <site_root>/<preset.source>/<file>
//! cache        <site_root>/.cache/<preset.destination>/<file>
//! destination  <output_root>/<preset.destination>/<file>
//! ```
//!
//! `<file>` is the image's path below the preset's source directory and may
//! contain sub-directories. Both relative paths are computed once, when the
//! asset is created.
//!
//! ## Decision order
//!
//! 1. **Unchanged**: the destination exists and the [`ModificationLedger`]
//!    shows it was already written this build from the source's current
//!    mtime. Nothing is read or written.
//! 2. **From cache**: the cache entry is newer than the source. It is copied
//!    to the destination.
//! 3. **Generated**: the pipeline runs, its output replaces the cache entry,
//!    and that is copied to the destination.
//!
//! The ledger is updated only once the destination copy has succeeded, so a
//! failed attempt is retried in full the next time it is requested.

use crate::cache::{self, is_cache_fresh, modified_time};
use crate::config::Preset;
use crate::imaging::{BackendError, ImageBackend, Pipeline, render};
use crate::ledger::ModificationLedger;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Image processing failed for {path}: {source}")]
    Imaging {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
}

impl AssetError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a call to [`DerivedAsset::materialize`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    /// Destination already current; no file read or written.
    Unchanged,
    /// Destination copied from a valid cache entry.
    FromCache,
    /// Pipeline ran; cache entry and destination rewritten.
    Generated,
}

impl Materialized {
    /// Whether the destination file was written.
    pub fn wrote(self) -> bool {
        !matches!(self, Materialized::Unchanged)
    }
}

/// A source image awaiting materialization under one preset.
#[derive(Debug, Clone)]
pub struct DerivedAsset {
    site_root: PathBuf,
    preset: String,
    destination_dir: PathBuf,
    file_name: PathBuf,
    source_relative: PathBuf,
    destination_relative: PathBuf,
    pipeline: Arc<Pipeline>,
}

impl DerivedAsset {
    /// Bind `file_name` (relative to the preset's source directory) to `preset`.
    pub fn new(site_root: impl Into<PathBuf>, preset: &Preset, file_name: impl Into<PathBuf>) -> Self {
        let file_name = file_name.into();
        Self {
            site_root: site_root.into(),
            preset: preset.name.clone(),
            source_relative: preset.source.join(&file_name),
            destination_relative: preset.destination.join(&file_name),
            destination_dir: preset.destination.clone(),
            file_name,
            pipeline: Arc::clone(&preset.pipeline),
        }
    }

    /// Name of the preset this asset belongs to.
    pub fn preset_name(&self) -> &str {
        &self.preset
    }

    /// Destination-space directory between the output root and `file_name`.
    pub fn relative_dir(&self) -> &Path {
        &self.destination_dir
    }

    /// Path below the preset directories; may contain sub-directories.
    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    /// Source path relative to the site root.
    pub fn source_relative(&self) -> &Path {
        &self.source_relative
    }

    /// Destination path relative to the output root.
    pub fn destination_relative(&self) -> &Path {
        &self.destination_relative
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn source_path(&self) -> PathBuf {
        self.site_root.join(&self.source_relative)
    }

    pub fn destination_path(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.destination_relative)
    }

    pub fn cache_path(&self) -> PathBuf {
        cache::cache_path(&self.site_root, &self.destination_relative)
    }

    /// Produce the destination file under `output_root`, reusing the cache
    /// or the ledger where possible. See the [module docs](self).
    ///
    /// Errors when the source cannot be read or the pipeline fails. The
    /// ledger is left untouched on error.
    pub fn materialize(
        &self,
        output_root: &Path,
        ledger: &ModificationLedger,
        backend: &impl ImageBackend,
    ) -> Result<Materialized, AssetError> {
        let source = self.source_path();
        let destination = self.destination_path(output_root);

        let source_mtime = modified_time(&source).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AssetError::SourceNotFound(source.clone()),
            _ => AssetError::io(&source, e),
        })?;

        if destination.is_file() && !ledger.is_modified(&source, &destination, source_mtime) {
            debug!("{}: unchanged", self.destination_relative.display());
            return Ok(Materialized::Unchanged);
        }

        let cache = self.cache_path();
        create_parent_dir(&cache)?;
        create_parent_dir(&destination)?;

        let outcome = if is_cache_fresh(&cache, source_mtime) {
            debug!("{}: cache hit", self.destination_relative.display());
            Materialized::FromCache
        } else {
            debug!(
                "{}: running {}",
                self.destination_relative.display(),
                self.pipeline
            );
            self.regenerate(backend, &source, &cache)?;
            Materialized::Generated
        };

        fs::copy(&cache, &destination).map_err(|e| AssetError::io(&destination, e))?;
        ledger.record(&source, &destination, source_mtime);
        Ok(outcome)
    }

    /// Run the pipeline into a sibling temp file, then move it over the
    /// cache entry so a failed run never leaves a half-written entry behind.
    fn regenerate(
        &self,
        backend: &impl ImageBackend,
        source: &Path,
        cache: &Path,
    ) -> Result<(), AssetError> {
        let staging = staging_path(cache);
        if let Err(source_err) = render(backend, source, &self.pipeline, &staging) {
            let _ = fs::remove_file(&staging);
            return Err(AssetError::Imaging {
                path: source.to_path_buf(),
                source: source_err,
            });
        }
        fs::rename(&staging, cache).map_err(|e| AssetError::io(cache, e))
    }
}

/// `dir/.tmp-name.ext` next to `path`; keeps the extension for encoders that
/// look at it.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".tmp-{name}"))
}

fn create_parent_dir(path: &Path) -> Result<(), AssetError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e)),
        None => Ok(()),
    }
}
