//! Offline write-behind queue.
//!
//! A durable, deduplicated list of pending mutations plus a tombstone set
//! of deleted record ids. Every mutating operation serializes the affected
//! state to the key-value store; persistence failures are logged and
//! swallowed so that losing durability never breaks the in-memory sync
//! path. Corrupt persisted state loads as empty.

use crate::error::SyncResult;
use praxis_storage::KeyValueStore;
use praxis_types::{EntityKind, QueueAction, QueueEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage slot holding the serialized mutation list.
pub const QUEUE_KEY: &str = "praxis.sync.queue";
/// Storage slot holding the serialized tombstone set.
pub const TOMBSTONES_KEY: &str = "praxis.sync.deleted";

/// Ids of locally deleted records, keyed by kind. Once an id is recorded
/// here, remote copies of it are excluded from merge results until an
/// explicit full reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Tombstones {
    clients: HashSet<String>,
    sessions: HashSet<String>,
}

impl Tombstones {
    fn set(&self, kind: EntityKind) -> &HashSet<String> {
        match kind {
            EntityKind::Clients => &self.clients,
            EntityKind::Sessions => &self.sessions,
        }
    }

    fn set_mut(&mut self, kind: EntityKind) -> &mut HashSet<String> {
        match kind {
            EntityKind::Clients => &mut self.clients,
            EntityKind::Sessions => &mut self.sessions,
        }
    }

    fn is_empty(&self) -> bool {
        self.clients.is_empty() && self.sessions.is_empty()
    }
}

/// The partition a [`OfflineQueue::drain`] pass produces. Together the two
/// lists cover every entry that was queued when the pass started, exactly
/// once each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainOutcome {
    /// Entries the handler confirmed against the remote store.
    pub successful: Vec<QueueEntry>,
    /// Entries that failed and remain queued for a later pass.
    pub failed: Vec<QueueEntry>,
}

/// Durable staging area for mutations not yet confirmed remotely.
pub struct OfflineQueue {
    entries: Vec<QueueEntry>,
    tombstones: Tombstones,
    store: Arc<dyn KeyValueStore>,
}

impl OfflineQueue {
    /// Loads the queue and tombstone set from the store. Missing or
    /// corrupt slots load as empty state.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let entries = load_slot(store.as_ref(), QUEUE_KEY).unwrap_or_default();
        let tombstones = load_slot(store.as_ref(), TOMBSTONES_KEY).unwrap_or_default();
        Self {
            entries,
            tombstones,
            store,
        }
    }

    // ── Mutation list ────────────────────────────────────────────

    /// Appends a mutation, stamped with the current time.
    ///
    /// Any existing entry for the same record id is removed first, so the
    /// queue holds at most one entry per id (latest write wins). Entries
    /// without an id are never deduplicated.
    pub fn enqueue(&mut self, action: QueueAction, data: Value) {
        let entry = QueueEntry::new(action, data);
        if let Some(id) = entry.entry_id() {
            let id = id.to_string();
            self.entries.retain(|e| e.entry_id() != Some(id.as_str()));
        }
        self.entries.push(entry);
        self.persist_entries();
    }

    /// Removes every entry whose payload carries `id`. No-op if absent.
    pub fn remove_by_id(&mut self, id: &str) {
        let before = self.entries.len();
        self.entries.retain(|e| e.entry_id() != Some(id));
        if self.entries.len() != before {
            self.persist_entries();
        }
    }

    /// Bulk removal: drops every queued entry matching one of `entries`,
    /// by id when the entry carries one, by equality otherwise.
    pub fn remove_entries(&mut self, entries: &[QueueEntry]) {
        let before = self.entries.len();
        self.entries.retain(|queued| {
            !entries.iter().any(|candidate| match queued.entry_id() {
                Some(id) => candidate.entry_id() == Some(id),
                None => candidate == queued,
            })
        });
        if self.entries.len() != before {
            self.persist_entries();
        }
    }

    /// Empties the mutation list. Tombstones are untouched.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist_entries();
    }

    /// Empties both the mutation list and the tombstone set.
    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.tombstones = Tombstones::default();
        self.persist_entries();
        self.persist_tombstones();
    }

    /// Returns a copy of the queued entries. Mutating the result does not
    /// affect the queue.
    #[must_use]
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.entries.clone()
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no mutations are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Tombstones ───────────────────────────────────────────────

    /// Records a locally initiated deletion. Persists only when the id was
    /// not already tombstoned, so repeated calls are idempotent.
    pub fn mark_deleted(&mut self, kind: EntityKind, id: &str) {
        if self.tombstones.set_mut(kind).insert(id.to_string()) {
            self.persist_tombstones();
        }
    }

    /// Whether `id` was deleted locally for `kind`.
    #[must_use]
    pub fn is_tombstoned(&self, kind: EntityKind, id: &str) -> bool {
        self.tombstones.set(kind).contains(id)
    }

    /// Returns a copy of the tombstoned ids for `kind`.
    #[must_use]
    pub fn tombstones(&self, kind: EntityKind) -> HashSet<String> {
        self.tombstones.set(kind).clone()
    }

    /// Empties the tombstone set only; queued mutations are untouched.
    pub fn clear_tombstones(&mut self) {
        if !self.tombstones.is_empty() {
            self.tombstones = Tombstones::default();
            self.persist_tombstones();
        }
    }

    // ── Drain ────────────────────────────────────────────────────

    /// Runs `handler` over every queued entry, strictly one at a time, in
    /// queue order.
    ///
    /// An entry whose handler resolves to `Ok(true)` is classified
    /// successful; `Ok(false)` and `Err(_)` both classify it failed and
    /// keep it queued. After the pass the queue is rewritten to exactly
    /// the failed subset, order preserved, and persisted once.
    pub async fn drain<F, Fut>(&mut self, mut handler: F) -> DrainOutcome
    where
        F: FnMut(QueueEntry) -> Fut,
        Fut: Future<Output = SyncResult<bool>>,
    {
        let pending = std::mem::take(&mut self.entries);
        let mut outcome = DrainOutcome::default();

        for entry in pending {
            match handler(entry.clone()).await {
                Ok(true) => outcome.successful.push(entry),
                Ok(false) => {
                    debug!(action = %entry.action, id = ?entry.entry_id(), "queued mutation rejected, retaining");
                    outcome.failed.push(entry);
                }
                Err(e) => {
                    warn!(action = %entry.action, id = ?entry.entry_id(), error = %e, "queued mutation failed, retaining");
                    outcome.failed.push(entry);
                }
            }
        }

        self.entries = outcome.failed.clone();
        self.persist_entries();
        outcome
    }

    // ── Persistence ──────────────────────────────────────────────

    fn persist_entries(&self) {
        persist_slot(self.store.as_ref(), QUEUE_KEY, &self.entries);
    }

    fn persist_tombstones(&self) {
        persist_slot(self.store.as_ref(), TOMBSTONES_KEY, &self.tombstones);
    }
}

fn load_slot<T: for<'de> Deserialize<'de>>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(key, error = %e, "failed to read persisted sync state, starting empty");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "corrupt persisted sync state, starting empty");
            None
        }
    }
}

fn persist_slot<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key, error = %e, "failed to serialize sync state");
            return;
        }
    };
    if let Err(e) = store.set(key, &raw) {
        warn!(key, error = %e, "failed to persist sync state");
    }
}
