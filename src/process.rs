//! Writer stage: materialize every scanned asset.
//!
//! Assets are grouped by destination path. Groups run in parallel on the
//! rayon pool; assets within a group run one after another in scan order, so
//! no two `materialize` calls ever target the same destination at once.
//!
//! A failing asset is collected into [`ProcessResult::failures`] and the
//! rest keep going. Progress is reported per asset through an optional
//! [`ProcessEvent`] channel, which the CLI drains on a printer thread.

use crate::asset::{AssetError, DerivedAsset, Materialized};
use crate::cache::CacheStats;
use crate::imaging::ImageBackend;
use crate::ledger::ModificationLedger;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tracing::{info, warn};

/// Progress report for one asset.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Materialized {
        preset: String,
        destination: PathBuf,
        outcome: Materialized,
    },
    Failed {
        preset: String,
        destination: PathBuf,
        error: String,
    },
}

#[derive(Debug)]
pub struct AssetFailure {
    pub preset: String,
    pub destination: PathBuf,
    pub error: AssetError,
}

#[derive(Debug, Default)]
pub struct ProcessResult {
    pub stats: CacheStats,
    pub failures: Vec<AssetFailure>,
}

impl ProcessResult {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Materialize `assets` under `output_root`.
pub fn process(
    assets: &[DerivedAsset],
    output_root: &Path,
    ledger: &ModificationLedger,
    backend: &impl ImageBackend,
    events: Option<Sender<ProcessEvent>>,
) -> ProcessResult {
    let mut groups: BTreeMap<&Path, Vec<&DerivedAsset>> = BTreeMap::new();
    for asset in assets {
        groups
            .entry(asset.destination_relative())
            .or_default()
            .push(asset);
    }
    let groups: Vec<Vec<&DerivedAsset>> = groups.into_values().collect();

    let outcomes: Vec<Vec<(&DerivedAsset, Result<Materialized, AssetError>)>> = groups
        .par_iter()
        .map(|group| {
            group
                .iter()
                .map(|asset| {
                    let result = asset.materialize(output_root, ledger, backend);
                    if let Some(tx) = &events {
                        tx.send(event_for(asset, &result)).ok();
                    }
                    (*asset, result)
                })
                .collect()
        })
        .collect();

    let mut result = ProcessResult::default();
    for (asset, outcome) in outcomes.into_iter().flatten() {
        match outcome {
            Ok(materialized) => result.stats.record(materialized),
            Err(error) => {
                warn!(
                    "preset '{}': {}: {error}",
                    asset.preset_name(),
                    asset.destination_relative().display()
                );
                result.failures.push(AssetFailure {
                    preset: asset.preset_name().to_string(),
                    destination: asset.destination_relative().to_path_buf(),
                    error,
                });
            }
        }
    }

    info!(
        "processed {} asset(s): {}, {} failed",
        assets.len(),
        result.stats,
        result.failures.len()
    );
    result
}

fn event_for(asset: &DerivedAsset, result: &Result<Materialized, AssetError>) -> ProcessEvent {
    let preset = asset.preset_name().to_string();
    let destination = asset.destination_relative().to_path_buf();
    match result {
        Ok(outcome) => ProcessEvent::Materialized {
            preset,
            destination,
            outcome: *outcome,
        },
        Err(e) => ProcessEvent::Failed {
            preset,
            destination,
            error: e.to_string(),
        },
    }
}
