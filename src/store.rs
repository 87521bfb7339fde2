use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{StorageError, StoreError};
use crate::models::{Priority, Status, Ticket};
use crate::storage::{Storage, TICKETS_KEY};
use crate::sync::{SyncBroadcaster, SyncEvent};
use crate::validate::{validate, TicketDraft};

/// Timestamp-derived id source. Strictly increasing within a process, even
/// for calls that land in the same millisecond.
struct IdGen {
    last: AtomicI64,
}

impl IdGen {
    fn new() -> Self {
        IdGen { last: AtomicI64::new(0) }
    }

    fn next(&self) -> i64 {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let next = if now_ms > prev { now_ms } else { prev + 1 };
            match self.last.compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Owner of the canonical ticket collection. Stateless against storage:
/// every operation is a read-modify-write of the whole serialized collection
/// under one key. Views keep their own projections and reload them on
/// notification; the store never hands out a live reference.
pub struct TicketStore {
    storage: Arc<dyn Storage>,
    broadcaster: Arc<SyncBroadcaster>,
    ids: IdGen,
}

impl TicketStore {
    pub fn new(storage: Arc<dyn Storage>, broadcaster: Arc<SyncBroadcaster>) -> Self {
        TicketStore {
            storage,
            broadcaster,
            ids: IdGen::new(),
        }
    }

    /// Read the persisted collection. An absent key seeds the fixed sample
    /// set; a snapshot that fails to parse or conform is treated as empty
    /// and reseeded so the corruption does not recur on the next load.
    pub fn load(&self) -> Result<Vec<Ticket>, StorageError> {
        match self.storage.get(TICKETS_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<Ticket>>(&raw) {
                Ok(tickets) => Ok(tickets),
                Err(err) => {
                    warn!(key = TICKETS_KEY, %err, "stored collection is corrupt, reseeding");
                    self.reseed()
                }
            },
            None => self.reseed(),
        }
    }

    /// Validate, assign an id and creation date, prepend, persist, notify.
    /// A rejected draft returns the field error map and mutates nothing.
    pub fn create(&self, draft: &TicketDraft) -> Result<Ticket, StoreError> {
        let valid = validate(draft).map_err(StoreError::Validation)?;

        let mut tickets = self.load()?;
        let mut id = self.ids.next();
        // Another process may have written ids from its own clock
        while tickets.iter().any(|t| t.id == id) {
            id = self.ids.next();
        }

        let ticket = Ticket {
            id,
            title: valid.title,
            description: valid.description,
            status: valid.status,
            priority: valid.priority,
            created: Utc::now().date_naive(),
        };

        tickets.insert(0, ticket.clone());
        self.persist(&tickets)?;
        self.broadcaster.notify(SyncEvent::TicketsChanged);
        debug!(id = ticket.id, "created ticket");
        Ok(ticket)
    }

    /// Replace the mutable fields of an existing ticket. `id` and `created`
    /// survive every update.
    pub fn update(&self, id: i64, draft: &TicketDraft) -> Result<Ticket, StoreError> {
        let mut tickets = self.load()?;
        let existing = tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::NotFound { id })?;

        let valid = validate(draft).map_err(StoreError::Validation)?;
        existing.title = valid.title;
        existing.description = valid.description;
        existing.status = valid.status;
        existing.priority = valid.priority;
        let updated = existing.clone();

        self.persist(&tickets)?;
        self.broadcaster.notify(SyncEvent::TicketsChanged);
        debug!(id, "updated ticket");
        Ok(updated)
    }

    /// Remove a ticket. A missing id is a stale-projection symptom, not a
    /// failure: it is logged and reported as `false`, and nothing is
    /// persisted or broadcast.
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut tickets = self.load()?;
        let before = tickets.len();
        tickets.retain(|t| t.id != id);
        if tickets.len() == before {
            warn!(id, "delete: ticket not present, treating as no-op");
            return Ok(false);
        }

        self.persist(&tickets)?;
        self.broadcaster.notify(SyncEvent::TicketsChanged);
        debug!(id, "deleted ticket");
        Ok(true)
    }

    fn reseed(&self) -> Result<Vec<Ticket>, StorageError> {
        let today = Utc::now().date_naive();
        let seed = vec![
            Ticket {
                id: self.ids.next(),
                title: "Login page not responsive on mobile".to_string(),
                description: Some(
                    "The login form overflows on screens smaller than 375px".to_string(),
                ),
                status: Status::Open,
                priority: Priority::High,
                created: today,
            },
            Ticket {
                id: self.ids.next(),
                title: "Database connection timeout".to_string(),
                description: Some(
                    "Users experiencing timeout errors during peak hours".to_string(),
                ),
                status: Status::InProgress,
                priority: Priority::Critical,
                created: today,
            },
        ];
        self.persist(&seed)?;
        Ok(seed)
    }

    fn persist(&self, tickets: &[Ticket]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(tickets).map_err(|source| StorageError::EncodeFailed {
            key: TICKETS_KEY.to_string(),
            source,
        })?;
        self.storage.set(TICKETS_KEY, &raw)
    }
}

/// Pure projection filter: status must match unless `None` (all), and the
/// needle, when non-empty, must be a case-insensitive substring of the title
/// or the description. Preserves collection order.
pub fn query(tickets: &[Ticket], filter_text: &str, status: Option<Status>) -> Vec<Ticket> {
    let needle = filter_text.to_lowercase();
    tickets
        .iter()
        .filter(|t| {
            let matches_status = status.is_none_or(|s| t.status == s);
            let matches_search = needle.is_empty()
                || t.title.to_lowercase().contains(&needle)
                || t.description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle));
            matches_status && matches_search
        })
        .cloned()
        .collect()
}

/// Aggregate counts for the dashboard tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketStats {
    pub open: usize,
    pub in_progress: usize,
    pub closed: usize,
    pub total: usize,
}

pub fn stats(tickets: &[Ticket]) -> TicketStats {
    let mut counts = TicketStats {
        total: tickets.len(),
        ..TicketStats::default()
    };
    for ticket in tickets {
        match ticket.status {
            Status::Open => counts.open += 1,
            Status::InProgress => counts.in_progress += 1,
            Status::Closed => counts.closed += 1,
        }
    }
    counts
}
