//! Cache-first reads and serialized writes against the remote.
//!
//! Reads hand back whatever is cached and revalidate in the background.
//! Writes go through the [`WriteQueue`] and are followed by a re-read of the
//! datasets they touch; nothing is patched locally.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use api_types::{dataset::Dataset, intent::WriteIntent};
use chrono::Utc;
use serde_json::Value;
use tokio::{
    sync::{Mutex, broadcast},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{BulkAck, CacheStore, EntryState, RemoteStore, SyncError, WriteQueue};

const UPDATES_CAPACITY: usize = 16;

/// Background revalidation started by [`Coordinator::read`].
#[derive(Debug)]
pub struct RefreshHandle {
    dataset: Dataset,
    task: JoinHandle<Result<usize, SyncError>>,
}

impl RefreshHandle {
    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    /// Waits for the fetch; the count is the number of rows now cached.
    pub async fn wait(self) -> Result<usize, SyncError> {
        self.task.await?
    }
}

#[derive(Debug)]
pub struct ReadOutcome {
    pub rows: Vec<Value>,
    /// State of the entry when it was read, before revalidation.
    pub state: EntryState,
    pub refresh: RefreshHandle,
}

struct Inner<R> {
    remote: R,
    cache: Mutex<CacheStore>,
    queue: WriteQueue,
    updates: broadcast::Sender<Dataset>,
}

pub struct Coordinator<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for Coordinator<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RemoteStore> Coordinator<R> {
    pub fn new(remote: R, cache: CacheStore, write_spacing: Duration) -> Self {
        let (updates, _) = broadcast::channel(UPDATES_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                remote,
                cache: Mutex::new(cache),
                queue: WriteQueue::new(write_spacing),
                updates,
            }),
        }
    }

    pub fn remote(&self) -> &R {
        &self.inner.remote
    }

    /// Cached rows right away, plus a handle on the fetch that replaces them.
    pub async fn read(&self, dataset: Dataset) -> ReadOutcome {
        let (rows, state) = self.inner.cache.lock().await.begin_refresh(dataset);
        let this = self.clone();
        let task = tokio::spawn(async move { this.refresh(dataset).await });
        ReadOutcome {
            rows,
            state,
            refresh: RefreshHandle { dataset, task },
        }
    }

    /// Fetches the dataset and overwrites its cache entry.
    ///
    /// On failure the cached rows stay as they are. The failure is only
    /// worth a warning when there is nothing cached to show instead.
    pub async fn refresh(&self, dataset: Dataset) -> Result<usize, SyncError> {
        let payload = match self.inner.remote.fetch(dataset).await {
            Ok(payload) => payload,
            Err(err) => {
                let had_cache = self.inner.cache.lock().await.mark_failed(dataset);
                if had_cache {
                    debug!(%dataset, error = %err, "refresh failed, serving cached rows");
                } else {
                    warn!(%dataset, error = %err, "refresh failed and nothing is cached");
                }
                return Err(err.into());
            }
        };

        let rows = rows_of(dataset, payload);
        let count = rows.len();
        {
            let mut cache = self.inner.cache.lock().await;
            cache.store(dataset, rows, Utc::now());
            if let Err(err) = cache.save() {
                warn!(%dataset, error = %err, "failed to persist cache");
            }
        }
        debug!(%dataset, count, "dataset refreshed");
        // Nobody listening is fine.
        let _ = self.inner.updates.send(dataset);
        Ok(count)
    }

    /// Submits one intent, then re-reads what it touched.
    pub async fn mutate(&self, intent: WriteIntent) -> Result<(), SyncError> {
        self.inner
            .queue
            .submit(&self.inner.remote, &intent)
            .await?;
        info!(kind = intent.kind(), "write accepted");
        self.reconcile(intent.affects().iter().copied()).await;
        Ok(())
    }

    /// Submits the intents strictly one after another, then re-reads once.
    pub async fn mutate_sequential(&self, intents: Vec<WriteIntent>) -> BulkAck {
        if intents.is_empty() {
            return BulkAck::default();
        }
        let ack = self.inner.queue.drain(&self.inner.remote, &intents).await;
        info!(
            submitted = ack.submitted,
            failed = ack.failed.len(),
            "batch finished"
        );
        self.reconcile(
            intents
                .iter()
                .flat_map(|intent| intent.affects().iter().copied()),
        )
        .await;
        ack
    }

    /// Starts a refresh of every dataset.
    pub fn prefetch_all(&self) -> Vec<RefreshHandle> {
        Dataset::ALL
            .into_iter()
            .map(|dataset| {
                let this = self.clone();
                RefreshHandle {
                    dataset,
                    task: tokio::spawn(async move { this.refresh(dataset).await }),
                }
            })
            .collect()
    }

    /// Notified with the dataset each time a refresh lands.
    pub fn subscribe(&self) -> broadcast::Receiver<Dataset> {
        self.inner.updates.subscribe()
    }

    pub async fn cached(&self, dataset: Dataset) -> Vec<Value> {
        self.inner.cache.lock().await.rows(dataset)
    }

    pub async fn state(&self, dataset: Dataset) -> EntryState {
        self.inner.cache.lock().await.state(dataset)
    }

    async fn reconcile(&self, datasets: impl Iterator<Item = Dataset>) {
        let datasets: BTreeSet<Dataset> = datasets.collect();
        for dataset in datasets {
            if let Err(err) = self.refresh(dataset).await {
                warn!(%dataset, error = %err, "re-read after write failed");
            }
        }
    }
}

fn rows_of(dataset: Dataset, payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(rows) => rows,
        other => {
            debug!(%dataset, kind = json_kind(&other), "non-array payload, treating as empty");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
