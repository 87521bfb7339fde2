use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage::Storage;

/// Change marker polled by other processes. Lives next to the collection
/// itself so the two always share a partition.
const REVISION_KEY: &str = "ticketapp_tickets_rev";

/// A notification names a topic and nothing else. Subscribers reload the
/// collection from storage rather than trusting a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    TicketsChanged,
}

impl SyncEvent {
    pub fn topic(self) -> &'static str {
        match self {
            SyncEvent::TicketsChanged => "tickets-changed",
        }
    }
}

/// Fans each mutation out to every live view. Two signals per call: an
/// in-process channel send to each subscriber in the same process, and a
/// revision bump other processes observe by polling. The producing process
/// cannot rely on seeing its own cross-process marker, which is why the
/// in-process channel exists at all.
pub struct SyncBroadcaster {
    storage: Arc<dyn Storage>,
    subscribers: Mutex<Vec<Sender<SyncEvent>>>,
}

impl SyncBroadcaster {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        SyncBroadcaster {
            storage,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register a view. The returned receiver yields one event per mutation;
    /// dropping it unsubscribes.
    pub fn subscribe(&self) -> Receiver<SyncEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().expect("subscriber lock poisoned").push(tx);
        rx
    }

    /// Called once per successful mutation, strictly after the collection
    /// write has completed. Notification is best-effort: a failed marker
    /// write is logged, not surfaced, since the mutation itself already
    /// succeeded.
    pub fn notify(&self, event: SyncEvent) {
        match self.bump_revision() {
            Ok(revision) => debug!(topic = event.topic(), revision, "broadcast"),
            Err(err) => warn!(topic = event.topic(), %err, "could not write change marker"),
        }

        let mut subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn revision(&self) -> Result<u64, StorageError> {
        let raw = self.storage.get(REVISION_KEY)?;
        Ok(raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0))
    }

    fn bump_revision(&self) -> Result<u64, StorageError> {
        let next = self.revision()? + 1;
        self.storage.set(REVISION_KEY, &next.to_string())?;
        Ok(next)
    }
}

/// Cross-process subscriber. Remembers the last revision it saw and reports
/// when the collection should be reloaded. Poll-on-signal only; there is no
/// delta to apply, the caller does a full reload.
pub struct ChangeWatcher {
    storage: Arc<dyn Storage>,
    last_seen: u64,
}

impl ChangeWatcher {
    pub fn new(storage: Arc<dyn Storage>) -> Result<Self, StorageError> {
        let last_seen = read_revision(storage.as_ref())?;
        Ok(ChangeWatcher { storage, last_seen })
    }

    pub fn changed(&mut self) -> Result<bool, StorageError> {
        let current = read_revision(self.storage.as_ref())?;
        if current != self.last_seen {
            self.last_seen = current;
            return Ok(true);
        }
        Ok(false)
    }
}

fn read_revision(storage: &dyn Storage) -> Result<u64, StorageError> {
    let raw = storage.get(REVISION_KEY)?;
    Ok(raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0))
}
