//! Derived-image cache for incremental builds.
//!
//! Running a pipeline means decoding, transforming and re-encoding an image,
//! which dominates build time. Every derivative is therefore also kept in a
//! cache directory inside the site root, and later builds copy from there
//! instead of re-running the pipeline while the source is unchanged.
//!
//! ## Layout
//!
//! ```text
//! <site_root>/.cache/<destination>/<file>
//! ```
//!
//! One entry per (preset, source file). Entries are overwritten when they go
//! stale and never pruned.
//!
//! ## Validity
//!
//! An entry is valid when it is a non-empty file whose modification time is
//! strictly newer than the source's. The check is mtime-based so it costs one
//! `stat` per file; an empty entry (left by an interrupted write) is never
//! trusted.
//!
//! Deleting `.cache/` forces every derivative to be regenerated on the next
//! build.

use crate::asset::Materialized;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Name of the cache directory within the site root.
pub const CACHE_DIR: &str = ".cache";

/// Root of the cache directory for a site.
pub fn cache_root(site_root: &Path) -> PathBuf {
    site_root.join(CACHE_DIR)
}

/// Cache entry for a derivative at `destination_relative` (relative to the
/// output root).
pub fn cache_path(site_root: &Path, destination_relative: &Path) -> PathBuf {
    cache_root(site_root).join(destination_relative)
}

/// Modification time of a file.
pub fn modified_time(path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Whether the cache entry at `path` can stand in for a fresh run of the
/// pipeline on a source last modified at `source_mtime`.
pub fn is_cache_fresh(path: &Path, source_mtime: SystemTime) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() || meta.len() == 0 {
        return false;
    }
    meta.modified()
        .map(|cached| cached > source_mtime)
        .unwrap_or(false)
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Pipeline ran, cache entry rewritten.
    pub generated: u32,
    /// Copied from a valid cache entry.
    pub cached: u32,
    /// Destination already current; nothing touched.
    pub unchanged: u32,
}

impl CacheStats {
    pub fn record(&mut self, outcome: Materialized) {
        match outcome {
            Materialized::Generated => self.generated += 1,
            Materialized::FromCache => self.cached += 1,
            Materialized::Unchanged => self.unchanged += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.generated + self.cached + self.unchanged
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cached == 0 && self.unchanged == 0 {
            return write!(f, "{} generated", self.generated);
        }
        if self.unchanged > 0 {
            write!(
                f,
                "{} cached, {} unchanged, {} generated ({} total)",
                self.cached,
                self.unchanged,
                self.generated,
                self.total()
            )
        } else {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                self.cached,
                self.generated,
                self.total()
            )
        }
    }
}
