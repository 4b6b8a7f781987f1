//! Talks to the remote sheet and keeps a local cache of what it returned.
//!
//! [`Coordinator`] is the single entry point: cache-first reads with
//! background revalidation, and writes serialized through a [`WriteQueue`].

pub use cache::{CacheEntry, CacheStore, EntryState};
pub use coordinator::{Coordinator, ReadOutcome, RefreshHandle};
pub use error::{RemoteError, SyncError};
pub use queue::{BulkAck, DEFAULT_WRITE_SPACING, FailedIntent, WriteQueue};
pub use remote::{HttpRemote, RemoteStore};
pub use settings::SettingsStore;

mod cache;
mod coordinator;
mod error;
mod persist;
mod queue;
mod remote;
mod settings;
