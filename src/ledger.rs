//! Per-build memo of source modification times.
//!
//! A [`ModificationLedger`] remembers, for every destination written during
//! the current build invocation, which source it was produced from and the
//! modification time that source had at the time. [`DerivedAsset::materialize`]
//! consults it to skip a destination it has already produced from the same
//! source version, without touching the cache.
//!
//! Entries are keyed by the `(source, destination)` pair: one source feeding
//! several presets has one entry per destination, so writing one derivative
//! never vouches for another.
//!
//! The ledger is **not** cross-run change detection: it starts empty in every
//! process, so the first build of a run always falls through to the cache
//! check. Durable skipping across runs is the cache's job (see
//! [`crate::cache`]).
//!
//! One ledger is created per build and shared by reference with every asset.
//! Entries are only ever inserted or overwritten.
//!
//! [`DerivedAsset::materialize`]: crate::asset::DerivedAsset::materialize

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

type Key = (PathBuf, PathBuf);

#[derive(Debug, Default)]
pub struct ModificationLedger {
    entries: Mutex<HashMap<Key, SystemTime>>,
}

impl ModificationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Key, SystemTime>> {
        // The map is valid after any panic mid-insert, so a poisoned lock is still usable
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(source: &Path, destination: &Path) -> Key {
        (source.to_path_buf(), destination.to_path_buf())
    }

    /// Whether `destination` needs work: never recorded from `source`, or
    /// recorded at a different source modification time than `mtime`.
    pub fn is_modified(&self, source: &Path, destination: &Path, mtime: SystemTime) -> bool {
        self.entries()
            .get(&Self::key(source, destination))
            .is_none_or(|recorded| *recorded != mtime)
    }

    /// Record that `destination` was written from `source` at modification
    /// time `mtime`.
    pub fn record(&self, source: &Path, destination: &Path, mtime: SystemTime) {
        self.entries().insert(Self::key(source, destination), mtime);
    }

    /// The source modification time recorded for this pair, if any.
    pub fn recorded(&self, source: &Path, destination: &Path) -> Option<SystemTime> {
        self.entries().get(&Self::key(source, destination)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
