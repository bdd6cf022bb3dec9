//! Preset scanning.
//!
//! Turns the configured presets into concrete [`DerivedAsset`]s by walking
//! each preset's source directory under the site root:
//!
//! ```text
//! site/
//! ├── config.toml           [presets.thumbs] source = "images"
//! └── images/                                destination = "generated/thumbs"
//!     ├── a.png             → generated/thumbs/a.png
//!     ├── notes.txt         (ignored: not an image)
//!     ├── .draft.png        (ignored: hidden)
//!     └── sub/
//!         └── b.jpg         → generated/thumbs/sub/b.jpg
//! ```
//!
//! Presets are visited in declared order and files in sorted order, so the
//! result is deterministic. Extensions are matched case-sensitively against
//! [`SUPPORTED_EXTENSIONS`]. A missing source directory contributes nothing.

use crate::asset::DerivedAsset;
use crate::config::{Preset, SiteConfig};
use crate::imaging::SUPPORTED_EXTENSIONS;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Every asset the configured presets produce, in preset then path order.
pub fn scan(config: &SiteConfig, site_root: &Path) -> Vec<DerivedAsset> {
    config
        .presets
        .iter()
        .flat_map(|preset| scan_preset(preset, site_root))
        .collect()
}

/// Assets for a single preset.
pub fn scan_preset(preset: &Preset, site_root: &Path) -> Vec<DerivedAsset> {
    let root = site_root.join(&preset.source);
    if !root.is_dir() {
        warn!(
            "preset '{}': source directory {} not found",
            preset.name,
            root.display()
        );
        return Vec::new();
    }

    let mut assets = Vec::new();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("preset '{}': {e}", preset.name);
                continue;
            }
        };
        // `Path::is_file` follows symlinks; symlinked directories are not descended
        if !entry.path().is_file() || !is_supported_image(entry.path()) {
            continue;
        }
        let Ok(file_name) = entry.path().strip_prefix(&root) else {
            continue;
        };
        debug!("preset '{}': {}", preset.name, file_name.display());
        assets.push(DerivedAsset::new(site_root, preset, file_name));
    }

    info!(
        "preset '{}': {} image(s) in {}",
        preset.name,
        assets.len(),
        preset.source.display()
    );
    assets
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}
