//! Serial write dispatch.
//!
//! One lock is held per dispatch, or for a whole batch, so writes never
//! overlap and consecutive dispatches are at least `spacing` apart.

use std::time::Duration;

use api_types::intent::WriteIntent;
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, error};

use crate::{RemoteError, RemoteStore};

pub const DEFAULT_WRITE_SPACING: Duration = Duration::from_millis(100);

/// An intent from a batch that the remote rejected.
#[derive(Debug)]
pub struct FailedIntent {
    pub position: usize,
    pub intent: WriteIntent,
    pub error: RemoteError,
}

/// Result of a sequential batch. The batch always runs to the end.
#[derive(Debug, Default)]
pub struct BulkAck {
    pub submitted: usize,
    pub failed: Vec<FailedIntent>,
}

impl BulkAck {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub struct WriteQueue {
    spacing: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl Default for WriteQueue {
    fn default() -> Self {
        Self::new(DEFAULT_WRITE_SPACING)
    }
}

impl WriteQueue {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            last_dispatch: Mutex::new(None),
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    pub async fn submit<R: RemoteStore>(
        &self,
        remote: &R,
        intent: &WriteIntent,
    ) -> Result<(), RemoteError> {
        let mut last = self.last_dispatch.lock().await;
        self.dispatch(&mut last, remote, intent).await
    }

    /// Submits every intent in order, one at a time. A failure is logged and
    /// recorded, then the next intent goes out.
    pub async fn drain<R: RemoteStore>(&self, remote: &R, intents: &[WriteIntent]) -> BulkAck {
        let mut last = self.last_dispatch.lock().await;
        let mut ack = BulkAck::default();
        for (position, intent) in intents.iter().enumerate() {
            match self.dispatch(&mut last, remote, intent).await {
                Ok(()) => ack.submitted += 1,
                Err(err) => {
                    error!(position, kind = intent.kind(), error = %err, "write failed, continuing");
                    ack.failed.push(FailedIntent {
                        position,
                        intent: intent.clone(),
                        error: err,
                    });
                }
            }
        }
        ack
    }

    async fn dispatch<R: RemoteStore>(
        &self,
        last: &mut Option<Instant>,
        remote: &R,
        intent: &WriteIntent,
    ) -> Result<(), RemoteError> {
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.spacing).await;
        }
        debug!(kind = intent.kind(), "dispatching write");
        let result = remote.submit(intent).await;
        *last = Some(Instant::now());
        result
    }
}
