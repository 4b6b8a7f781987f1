//! Last good rows per dataset, persisted as one JSON file.

use std::{collections::BTreeMap, path::PathBuf};

use api_types::dataset::Dataset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{
    SyncError,
    persist::{read_json_file, write_json_file},
};

/// Freshness of one dataset's cached rows.
///
/// `Empty` until the first successful fetch, `Fresh` right after one and
/// `Stale` while a refresh is pending or after it failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntryState {
    #[default]
    Empty,
    Stale,
    Fresh,
}

fn stale() -> EntryState {
    EntryState::Stale
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub rows: Vec<Value>,
    pub fetched_at: DateTime<Utc>,
    // Rows loaded from disk have not been revalidated by this process.
    #[serde(skip, default = "stale")]
    pub state: EntryState,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    entries: BTreeMap<Dataset, CacheEntry>,
}

#[derive(Debug, Default)]
pub struct CacheStore {
    path: Option<PathBuf>,
    file: CacheFile,
}

impl CacheStore {
    /// A cache that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the cache file; a missing or unreadable one starts empty.
    pub fn load_or_empty(path: PathBuf) -> Self {
        let file = match read_json_file::<CacheFile>(&path) {
            Ok(file) => file.unwrap_or_default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable cache file");
                CacheFile::default()
            }
        };
        Self {
            path: Some(path),
            file,
        }
    }

    pub fn entry(&self, dataset: Dataset) -> Option<&CacheEntry> {
        self.file.entries.get(&dataset)
    }

    pub fn rows(&self, dataset: Dataset) -> Vec<Value> {
        self.entry(dataset)
            .map(|entry| entry.rows.clone())
            .unwrap_or_default()
    }

    pub fn state(&self, dataset: Dataset) -> EntryState {
        self.entry(dataset).map_or(EntryState::Empty, |e| e.state)
    }

    pub fn has(&self, dataset: Dataset) -> bool {
        self.file.entries.contains_key(&dataset)
    }

    /// Snapshot handed to the caller before a refresh; the entry, if any,
    /// becomes stale until the refresh lands.
    pub(crate) fn begin_refresh(&mut self, dataset: Dataset) -> (Vec<Value>, EntryState) {
        match self.file.entries.get_mut(&dataset) {
            Some(entry) => {
                let seen = entry.state;
                entry.state = EntryState::Stale;
                (entry.rows.clone(), seen)
            }
            None => (Vec::new(), EntryState::Empty),
        }
    }

    pub(crate) fn store(&mut self, dataset: Dataset, rows: Vec<Value>, fetched_at: DateTime<Utc>) {
        self.file.entries.insert(
            dataset,
            CacheEntry {
                rows,
                fetched_at,
                state: EntryState::Fresh,
            },
        );
    }

    /// Returns whether there were rows to fall back on.
    pub(crate) fn mark_failed(&mut self, dataset: Dataset) -> bool {
        match self.file.entries.get_mut(&dataset) {
            Some(entry) => {
                entry.state = EntryState::Stale;
                true
            }
            None => false,
        }
    }

    pub fn save(&self) -> Result<(), SyncError> {
        match &self.path {
            Some(path) => write_json_file(path, &self.file),
            None => Ok(()),
        }
    }
}
