//! Site configuration module.
//!
//! Loads and validates `config.toml` from the site root. The file holds the
//! named presets that drive derived-image generation, plus processing
//! settings.
//!
//! ## Configuration Options
//!
//! ```toml
//! [presets.thumbs]
//! source = "images"                 # where originals live (relative to the site root)
//! destination = "generated/thumbs"  # where derivatives go (relative to the output root)
//! resize = "100x100"                # every other key is a transform step, applied in order
//! quality = 80
//!
//! [processing]
//! max_processes = 4                 # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! `source` and `destination` are reserved: they are pulled out of the preset
//! before the remaining keys are read as its pipeline. Presets and their
//! steps keep the order they are written in.
//!
//! ## Validation
//!
//! Everything is checked at load time: a preset without a `source` or
//! `destination`, an unknown operation name, or an argument an operation
//! cannot parse is a [`ConfigError`] naming the preset. Unknown top-level
//! keys are rejected to catch typos early.

use crate::imaging::{OperationError, Pipeline};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Name of the config file inside the site root.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Preset keys that are configuration, not transform steps.
const RESERVED_KEYS: &[&str] = &["source", "destination"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Preset '{preset}': {source}")]
    Operation {
        preset: String,
        #[source]
        source: OperationError,
    },
}

/// One named source → destination transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    /// Table key, used for logging.
    pub name: String,
    /// Directory of originals, relative to the site root.
    pub source: PathBuf,
    /// Directory of derivatives, relative to the output root.
    pub destination: PathBuf,
    /// Shared by every asset the preset produces.
    pub pipeline: Arc<Pipeline>,
}

impl Preset {
    /// Build a preset from its `[presets.<name>]` table.
    pub fn from_table(name: &str, table: &toml::Table) -> Result<Self, ConfigError> {
        let source = preset_dir(name, table, "source")?;
        let destination = preset_dir(name, table, "destination")?;
        let pipeline = Pipeline::parse(
            table
                .iter()
                .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.as_str(), value)),
        )
        .map_err(|source| ConfigError::Operation {
            preset: name.to_string(),
            source,
        })?;

        Ok(Self {
            name: name.to_string(),
            source,
            destination,
            pipeline: Arc::new(pipeline),
        })
    }
}

/// Read a reserved directory key: present, a string, non-empty, relative.
fn preset_dir(preset: &str, table: &toml::Table, key: &str) -> Result<PathBuf, ConfigError> {
    let value = table.get(key).ok_or_else(|| {
        ConfigError::Validation(format!("presets.{preset}.{key} is required"))
    })?;
    let dir = value.as_str().ok_or_else(|| {
        ConfigError::Validation(format!("presets.{preset}.{key} must be a string"))
    })?;
    let trimmed = dir.trim_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::Validation(format!(
            "presets.{preset}.{key} must not be empty"
        )));
    }
    let path = PathBuf::from(trimmed);
    if path.is_absolute() || dir.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "presets.{preset}.{key} must be relative, got '{dir}'"
        )));
    }
    Ok(path)
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// On-disk shape, before presets are validated.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    presets: Option<toml::Table>,
    processing: ProcessingConfig,
}

/// Validated site configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteConfig {
    /// Presets in declared order. Empty when the file has no `[presets]`.
    pub presets: Vec<Preset>,
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Parse and validate config text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        let mut presets = Vec::new();
        for (name, value) in raw.presets.iter().flatten() {
            let table = value.as_table().ok_or_else(|| {
                ConfigError::Validation(format!("presets.{name} must be a table"))
            })?;
            presets.push(Preset::from_table(name, table)?);
        }
        Ok(Self {
            presets,
            processing: raw.processing,
        })
    }

    pub fn has_presets(&self) -> bool {
        !self.presets.is_empty()
    }
}

/// Path of the config file for a site root.
pub fn config_path(site_root: &Path) -> PathBuf {
    site_root.join(CONFIG_FILENAME)
}

/// Load config from `path`.
///
/// A missing file is not an error: it yields the defaults, which have no
/// presets, so a build does nothing.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.exists() {
        return Ok(SiteConfig::default());
    }
    let content = fs::read_to_string(path)?;
    SiteConfig::parse(&content)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Presets Configuration
# ===========================
# Each [presets.<name>] table turns every PNG/JPEG/GIF under `source` into a
# derivative under `destination`. Sub-directories are preserved.
#
# `source` is relative to the site root, `destination` to the output root.
# Every other key is a transform step. Steps run in the order written.
# Unknown keys will cause an error.
#
# Steps:
#   resize    = "100x100"      fit inside the box (also "800x", "x600", "50%")
#               "100x100^"     cover the box
#               "100x100!"     exact size, aspect ignored
#               "800x>"        only ever shrink
#   thumbnail = "100x100"      same as resize
#   crop      = "200x200+10+10"
#   rotate    = 90             multiples of 90
#   flip      = true           mirror vertically
#   flop      = true           mirror horizontally
#   grayscale = true
#   blur      = 1.5            gaussian sigma
#   sharpen   = "0.5x2"        unsharp mask: sigma, or SIGMAxTHRESHOLD
#               true           light unsharp mask (0.5x0)
#   quality   = 85             JPEG quality, 1-100
#   format    = "webp"         encoding of the output (the file name is kept)

[presets.thumbnails]
source = "images"
destination = "generated/thumbnails"
resize = "300x300"
quality = 85

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Operation;
    use tempfile::TempDir;

    #[test]
    fn empty_config_has_no_presets() {
        let config = SiteConfig::parse("").unwrap();
        assert!(!config.has_presets());
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_single_preset() {
        let config = SiteConfig::parse(
            r#"
[presets.thumbs]
source = "images"
destination = "generated/thumbs"
resize = "100x100"
"#,
        )
        .unwrap();

        assert_eq!(config.presets.len(), 1);
        let preset = &config.presets[0];
        assert_eq!(preset.name, "thumbs");
        assert_eq!(preset.source, PathBuf::from("images"));
        assert_eq!(preset.destination, PathBuf::from("generated/thumbs"));
        assert_eq!(preset.pipeline.to_string(), "resize 100x100");
    }

    #[test]
    fn reserved_keys_never_reach_pipeline() {
        let config = SiteConfig::parse(
            r#"
[presets.p]
resize = "10x10"
source = "a"
flip = true
destination = "b"
"#,
        )
        .unwrap();
        let names: Vec<&str> = config.presets[0]
            .pipeline
            .operations()
            .iter()
            .map(Operation::name)
            .collect();
        assert_eq!(names, vec!["resize", "flip"]);
    }

    #[test]
    fn presets_and_steps_keep_declared_order() {
        let config = SiteConfig::parse(
            r#"
[presets.zebra]
source = "z"
destination = "out/z"
quality = 50
crop = "10x10"
resize = "5x5"

[presets.alpha]
source = "a"
destination = "out/a"
"#,
        )
        .unwrap();

        let names: Vec<&str> = config.presets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zebra", "alpha"]);
        assert_eq!(
            config.presets[0].pipeline.to_string(),
            "quality 50, crop 10x10+0+0, resize 5x5"
        );
        assert!(config.presets[1].pipeline.is_empty());
    }

    #[test]
    fn missing_source_is_error() {
        let result = SiteConfig::parse(
            r#"
[presets.p]
destination = "out"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(msg)) if msg.contains("presets.p.source")));
    }

    #[test]
    fn non_string_destination_is_error() {
        let result = SiteConfig::parse(
            r#"
[presets.p]
source = "in"
destination = 42
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(msg)) if msg.contains("must be a string")));
    }

    #[test]
    fn absolute_directory_is_error() {
        let result = SiteConfig::parse(
            r#"
[presets.p]
source = "/etc"
destination = "out"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Validation(msg)) if msg.contains("relative")));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = SiteConfig::parse(
            r#"
[presets.p]
source = "images/"
destination = "out/thumbs/"
"#,
        )
        .unwrap();
        assert_eq!(config.presets[0].source, PathBuf::from("images"));
        assert_eq!(config.presets[0].destination, PathBuf::from("out/thumbs"));
    }

    #[test]
    fn unknown_operation_names_preset() {
        let err = SiteConfig::parse(
            r#"
[presets.thumbs]
source = "in"
destination = "out"
sepia = "80%"
"#,
        )
        .unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::Operation { preset, source: OperationError::Unknown(op) }
                if preset == "thumbs" && op == "sepia"
        ));
        assert!(err.to_string().starts_with("Preset 'thumbs'"));
    }

    #[test]
    fn preset_must_be_table() {
        let result = SiteConfig::parse("presets = { p = 3 }");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn unknown_top_level_key_rejected() {
        let result = SiteConfig::parse("mini_magick = {}");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_processing_key_rejected() {
        let result = SiteConfig::parse("[processing]\nworkers = 2");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn presets_share_one_pipeline_per_preset() {
        let config = SiteConfig::parse(
            r#"
[presets.p]
source = "in"
destination = "out"
resize = "10x10"
"#,
        )
        .unwrap();
        let a = Arc::clone(&config.presets[0].pipeline);
        let b = Arc::clone(&config.presets[0].pipeline);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&config_path(tmp.path())).unwrap();
        assert_eq!(config, SiteConfig::default());
    }

    #[test]
    fn load_from_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            config_path(tmp.path()),
            "[presets.p]\nsource = \"in\"\ndestination = \"out\"\n\n[processing]\nmax_processes = 2\n",
        )
        .unwrap();
        let config = load_config(&config_path(tmp.path())).unwrap();
        assert_eq!(config.presets.len(), 1);
        assert_eq!(config.processing.max_processes, Some(2));
    }

    #[test]
    fn load_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(config_path(tmp.path()), "[presets.p\n").unwrap();
        assert!(matches!(
            load_config(&config_path(tmp.path())),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn stock_config_is_valid() {
        let config = SiteConfig::parse(stock_config_toml()).unwrap();
        assert_eq!(config.presets.len(), 1);
        assert_eq!(config.presets[0].name, "thumbnails");
        assert_eq!(
            config.presets[0].pipeline.to_string(),
            "resize 300x300, quality 85"
        );
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 100),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_never_zero() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }
}
