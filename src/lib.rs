//! # Image Presets
//!
//! Incremental, cache-backed derived images for static sites. A `config.toml`
//! names presets, each a source directory, a destination directory and an
//! ordered list of image operations. Every image under a source directory is
//! run through its preset's pipeline and written below the output root, but
//! only when the source has changed since the derivative was last produced.
//!
//! # Architecture
//!
//! ```text
//! 1. Config    config.toml        →  Vec<Preset>          (validated pipelines)
//! 2. Scan      presets + site/    →  Vec<DerivedAsset>    (one per image per preset)
//! 3. Process   assets             →  output/<dest>/<file> (cached, incremental)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.toml` loading, preset extraction, operation validation |
//! | [`imaging`] | Operation registry and the pure-Rust image backend |
//! | [`scan`] | Walks each preset's source directory into [`asset::DerivedAsset`]s |
//! | [`asset`] | Path algebra and the skip / copy / regenerate decision |
//! | [`ledger`] | Per-build memo of source modification times |
//! | [`cache`] | `.cache/` layout, entry freshness, hit statistics |
//! | [`process`] | Materializes assets in parallel, isolating failures |
//! | [`output`] | CLI output formatting |
//!
//! # Two Levels of Skipping
//!
//! The [`ledger`] answers "did this build already write this destination from
//! the same source version?". It lives in memory for one build and costs no
//! filesystem access beyond a `stat` of the source.
//!
//! The [`cache`] answers "is there output from an earlier build newer than the
//! source?". It survives across builds in `<site>/.cache/` and saves the
//! decode, transform and encode work, at the price of one copy.
//!
//! # Example
//!
//! ```no_run
//! use image_presets::{config, ledger::ModificationLedger, process, scan};
//! use image_presets::imaging::RustBackend;
//! use std::path::Path;
//!
//! let site = Path::new("site");
//! let config = config::load_config(&config::config_path(site))?;
//! let assets = scan::scan(&config, site);
//! let result = process::process(
//!     &assets,
//!     &site.join("_site"),
//!     &ModificationLedger::new(),
//!     &RustBackend::new(),
//!     None,
//! );
//! println!("{}", result.stats);
//! # Ok::<(), config::ConfigError>(())
//! ```

pub mod asset;
pub mod cache;
pub mod config;
pub mod imaging;
pub mod ledger;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
