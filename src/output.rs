//! CLI output formatting.
//!
//! Every stage has a pure `format_*` function returning display lines, which
//! is what the tests exercise, and a thin `print_*` wrapper the binary calls.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! thumbs (2 images): resize 300x300, quality 85
//!     a.png → generated/thumbs/a.png
//!     sub/b.jpg → generated/thumbs/sub/b.jpg
//! ```
//!
//! ## Build
//!
//! ```text
//! generated  generated/thumbs/a.png
//! cached     generated/thumbs/sub/b.jpg
//! FAILED     generated/thumbs/c.png: Source image not found: site/images/c.png
//! ```

use crate::asset::{DerivedAsset, Materialized};
use crate::config::SiteConfig;
use crate::process::{AssetFailure, ProcessEvent};
use serde::Serialize;
use std::path::PathBuf;

/// Machine-readable view of a scanned asset (`scan --json`).
#[derive(Debug, Serialize, PartialEq)]
pub struct PlannedAsset {
    pub preset: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub pipeline: String,
}

impl From<&DerivedAsset> for PlannedAsset {
    fn from(asset: &DerivedAsset) -> Self {
        Self {
            preset: asset.preset_name().to_string(),
            source: asset.source_relative().to_path_buf(),
            destination: asset.destination_relative().to_path_buf(),
            pipeline: asset.pipeline().to_string(),
        }
    }
}

pub fn planned_assets(assets: &[DerivedAsset]) -> Vec<PlannedAsset> {
    assets.iter().map(PlannedAsset::from).collect()
}

// ============================================================================
// Config
// ============================================================================

/// One header line per preset plus its pipeline.
pub fn format_config_summary(config: &SiteConfig) -> Vec<String> {
    if !config.has_presets() {
        return vec!["No presets configured".to_string()];
    }
    let mut lines = Vec::new();
    for preset in &config.presets {
        lines.push(format!(
            "{}: {} \u{2192} {}",
            preset.name,
            preset.source.display(),
            preset.destination.display()
        ));
        lines.push(format!("    {}", preset.pipeline));
    }
    lines
}

pub fn print_config_summary(config: &SiteConfig) {
    for line in format_config_summary(config) {
        println!("{}", line);
    }
}

// ============================================================================
// Scan
// ============================================================================

/// Assets grouped under their preset, in scan order.
pub fn format_scan_output(assets: &[DerivedAsset]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0;
    while start < assets.len() {
        let preset = assets[start].preset_name();
        let end = assets[start..]
            .iter()
            .position(|a| a.preset_name() != preset)
            .map_or(assets.len(), |offset| start + offset);
        let group = &assets[start..end];

        lines.push(format!(
            "{} ({} {}): {}",
            preset,
            group.len(),
            if group.len() == 1 { "image" } else { "images" },
            group[0].pipeline()
        ));
        for asset in group {
            lines.push(format!(
                "    {} \u{2192} {}",
                asset.file_name().display(),
                asset.destination_relative().display()
            ));
        }
        start = end;
    }
    if lines.is_empty() {
        lines.push("No images found".to_string());
    }
    lines
}

pub fn print_scan_output(assets: &[DerivedAsset]) {
    for line in format_scan_output(assets) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

fn outcome_label(outcome: Materialized) -> &'static str {
    match outcome {
        Materialized::Generated => "generated",
        Materialized::FromCache => "cached",
        Materialized::Unchanged => "unchanged",
    }
}

/// A single progress line for one asset.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Materialized {
            destination,
            outcome,
            ..
        } => vec![format!(
            "{:<10} {}",
            outcome_label(*outcome),
            destination.display()
        )],
        ProcessEvent::Failed {
            destination, error, ..
        } => vec![format!("{:<10} {}: {}", "FAILED", destination.display(), error)],
    }
}

/// End-of-build failure report; empty when nothing failed.
pub fn format_failures(failures: &[AssetFailure]) -> Vec<String> {
    if failures.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("{} asset(s) failed:", failures.len())];
    for failure in failures {
        lines.push(format!(
            "    [{}] {}: {}",
            failure.preset,
            failure.destination.display(),
            failure.error
        ));
    }
    lines
}

pub fn print_failures(failures: &[AssetFailure]) {
    for line in format_failures(failures) {
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetError;
    use crate::imaging::Operation;
    use crate::test_helpers::preset;

    fn assets() -> Vec<DerivedAsset> {
        let resize = Operation::Resize("100x100".parse().unwrap());
        let thumbs = preset("thumbs", "images", "generated/thumbs", vec![resize]);
        let large = preset("large", "images", "generated/large", vec![]);
        vec![
            DerivedAsset::new("/site", &thumbs, "a.png"),
            DerivedAsset::new("/site", &thumbs, "sub/b.jpg"),
            DerivedAsset::new("/site", &large, "a.png"),
        ]
    }

    #[test]
    fn scan_output_groups_by_preset() {
        let lines = format_scan_output(&assets());
        assert_eq!(
            lines,
            vec![
                "thumbs (2 images): resize 100x100",
                "    a.png \u{2192} generated/thumbs/a.png",
                "    sub/b.jpg \u{2192} generated/thumbs/sub/b.jpg",
                "large (1 image): (copy)",
                "    a.png \u{2192} generated/large/a.png",
            ]
        );
    }

    #[test]
    fn scan_output_empty() {
        assert_eq!(format_scan_output(&[]), vec!["No images found"]);
    }

    #[test]
    fn planned_assets_are_site_relative() {
        let planned = planned_assets(&assets());
        assert_eq!(
            planned[1],
            PlannedAsset {
                preset: "thumbs".to_string(),
                source: PathBuf::from("images/sub/b.jpg"),
                destination: PathBuf::from("generated/thumbs/sub/b.jpg"),
                pipeline: "resize 100x100".to_string(),
            }
        );
        let json = serde_json::to_value(&planned[0]).unwrap();
        assert_eq!(json["destination"], "generated/thumbs/a.png");
    }

    #[test]
    fn config_summary_lists_presets() {
        let config = SiteConfig {
            presets: vec![preset("thumbs", "images", "generated/thumbs", vec![Operation::Flip])],
            ..SiteConfig::default()
        };
        assert_eq!(
            format_config_summary(&config),
            vec!["thumbs: images \u{2192} generated/thumbs", "    flip"]
        );
        assert_eq!(
            format_config_summary(&SiteConfig::default()),
            vec!["No presets configured"]
        );
    }

    #[test]
    fn process_event_lines() {
        let event = ProcessEvent::Materialized {
            preset: "thumbs".to_string(),
            destination: PathBuf::from("generated/thumbs/a.png"),
            outcome: Materialized::FromCache,
        };
        assert_eq!(
            format_process_event(&event),
            vec!["cached     generated/thumbs/a.png"]
        );

        let event = ProcessEvent::Failed {
            preset: "thumbs".to_string(),
            destination: PathBuf::from("generated/thumbs/c.png"),
            error: "boom".to_string(),
        };
        assert_eq!(
            format_process_event(&event),
            vec!["FAILED     generated/thumbs/c.png: boom"]
        );
    }

    #[test]
    fn failures_report() {
        assert!(format_failures(&[]).is_empty());
        let failures = vec![AssetFailure {
            preset: "thumbs".to_string(),
            destination: PathBuf::from("generated/thumbs/c.png"),
            error: AssetError::SourceNotFound(PathBuf::from("/site/images/c.png")),
        }];
        assert_eq!(
            format_failures(&failures),
            vec![
                "1 asset(s) failed:",
                "    [thumbs] generated/thumbs/c.png: Source image not found: /site/images/c.png",
            ]
        );
    }
}
