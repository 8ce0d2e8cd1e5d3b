//! Sync orchestrator.
//!
//! Owns the offline queue and the remote adapter, tracks connection state,
//! and drives the ping → drain → fetch → merge → notify cycle. All state
//! lives behind `Arc`s so the orchestrator is cheap to clone; the
//! fire-and-forget drain scheduled after a merge runs a clone on a spawned
//! task.
//!
//! Nothing here propagates an error to the caller: failure is communicated
//! through return values only, so a UI thread can call straight into the
//! orchestrator without unwinding on every transient network blip.

use crate::error::SyncError;
use crate::queue::{DrainOutcome, OfflineQueue};
use crate::remote::{RemoteAdapter, RemoteSnapshot};
use praxis_storage::KeyValueStore;
use praxis_types::{parse_iso_millis, Client, EntityKind, QueueAction, QueueEntry, Session, SyncRecord};
use serde::Serialize;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Connection state as last observed by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Offline,
    Online,
}

/// The reconciled snapshot a sync cycle hands back to the caller, which
/// owns the authoritative collections and is responsible for adopting it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedData {
    pub clients: Vec<Client>,
    pub sessions: Vec<Session>,
}

/// Result of a [`SyncOrchestrator::push_change`] attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOutcome {
    /// The change was confirmed against the remote store.
    pub success: bool,
    /// The change remains in the offline queue.
    pub queued: bool,
}

type ConnectionListener = Box<dyn Fn(bool, &str) + Send + Sync>;
type SyncCompleteListener = Box<dyn Fn(&MergedData) + Send + Sync>;

/// Drives synchronization between the local collections and the remote
/// store. Cloning shares all state.
#[derive(Clone)]
pub struct SyncOrchestrator {
    remote: Arc<RemoteAdapter>,
    queue: Arc<Mutex<OfflineQueue>>,
    status: Arc<RwLock<ConnectionStatus>>,
    sync_in_progress: Arc<AtomicBool>,
    connection_listeners: Arc<std::sync::RwLock<Vec<ConnectionListener>>>,
    sync_listeners: Arc<std::sync::RwLock<Vec<SyncCompleteListener>>>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator owning a queue persisted through `store`.
    pub fn new(remote: RemoteAdapter, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            remote: Arc::new(remote),
            queue: Arc::new(Mutex::new(OfflineQueue::new(store))),
            status: Arc::new(RwLock::new(ConnectionStatus::Offline)),
            sync_in_progress: Arc::new(AtomicBool::new(false)),
            connection_listeners: Arc::new(std::sync::RwLock::new(Vec::new())),
            sync_listeners: Arc::new(std::sync::RwLock::new(Vec::new())),
        }
    }

    // ── State accessors ──────────────────────────────────────────

    /// The connection state from the last probe.
    pub async fn connection_status(&self) -> ConnectionStatus {
        *self.status.read().await
    }

    /// True while a sync cycle is running.
    #[must_use]
    pub fn sync_in_progress(&self) -> bool {
        self.sync_in_progress.load(Ordering::SeqCst)
    }

    /// Number of queued mutations.
    pub async fn pending_count(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Copy of the queued mutations.
    pub async fn pending_entries(&self) -> Vec<QueueEntry> {
        self.queue.lock().await.entries()
    }

    /// Whether `id` was deleted locally for `kind`.
    pub async fn is_tombstoned(&self, kind: EntityKind, id: &str) -> bool {
        self.queue.lock().await.is_tombstoned(kind, id)
    }

    // ── Listener registration ────────────────────────────────────

    /// Registers a connection-change listener, invoked with the online
    /// flag and a human-readable status line. Invocation order is
    /// registration order.
    pub fn on_connection_change<F>(&self, listener: F)
    where
        F: Fn(bool, &str) + Send + Sync + 'static,
    {
        self.connection_listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(listener));
    }

    /// Registers a sync-complete listener, invoked with each merged
    /// snapshot.
    pub fn on_sync_complete<F>(&self, listener: F)
    where
        F: Fn(&MergedData) + Send + Sync + 'static,
    {
        self.sync_listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(listener));
    }

    fn notify_connection(&self, online: bool, text: &str) {
        let listeners = self
            .connection_listeners
            .read()
            .unwrap_or_else(|e| e.into_inner());
        for listener in listeners.iter() {
            if catch_unwind(AssertUnwindSafe(|| listener(online, text))).is_err() {
                warn!("connection listener panicked");
            }
        }
    }

    fn notify_sync_complete(&self, merged: &MergedData) {
        let listeners = self.sync_listeners.read().unwrap_or_else(|e| e.into_inner());
        for listener in listeners.iter() {
            if catch_unwind(AssertUnwindSafe(|| listener(merged))).is_err() {
                warn!("sync-complete listener panicked");
            }
        }
    }

    // ── Connection probing ───────────────────────────────────────

    /// Probes the remote store and updates connection state.
    ///
    /// Unconfigured adapters land offline with a "local storage only"
    /// status. Otherwise listeners see a transient "connecting" status,
    /// then the final one. Returns the resulting online flag.
    pub async fn probe_connection(&self) -> bool {
        if !self.remote.is_configured() {
            *self.status.write().await = ConnectionStatus::Offline;
            self.notify_connection(false, "Local storage only");
            return false;
        }

        self.notify_connection(false, "Connecting...");
        let online = self.remote.ping().await;

        *self.status.write().await = if online {
            ConnectionStatus::Online
        } else {
            ConnectionStatus::Offline
        };

        let text = if online {
            let pending = self.queue.lock().await.len();
            if pending > 0 {
                format!("Online ({pending} pending)")
            } else {
                "Online".to_string()
            }
        } else {
            "Offline".to_string()
        };
        self.notify_connection(online, &text);
        online
    }

    async fn is_online(&self) -> bool {
        *self.status.read().await == ConnectionStatus::Online
    }

    // ── Sync cycle ───────────────────────────────────────────────

    /// Runs one full sync cycle: drain the queue, initialize the remote,
    /// fetch its snapshot, merge against the given local collections, and
    /// notify sync-complete listeners.
    ///
    /// Returns `None` without doing anything when offline, unconfigured,
    /// or when another cycle is already in progress; at most one cycle
    /// runs at a time. The input slices are read-only snapshots; the
    /// caller adopts the returned merged collections.
    pub async fn run_sync_cycle(
        &self,
        local_clients: &[Client],
        local_sessions: &[Session],
    ) -> Option<MergedData> {
        if !self.remote.is_configured() || !self.is_online().await {
            return None;
        }
        if self
            .sync_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("sync cycle already in progress, skipping");
            return None;
        }

        let result = self.run_cycle_inner(local_clients, local_sessions).await;
        self.sync_in_progress.store(false, Ordering::SeqCst);
        result
    }

    async fn run_cycle_inner(
        &self,
        local_clients: &[Client],
        local_sessions: &[Session],
    ) -> Option<MergedData> {
        let drained = self.drain_queue().await;
        if !drained.successful.is_empty() || !drained.failed.is_empty() {
            info!(
                pushed = drained.successful.len(),
                retained = drained.failed.len(),
                "drained offline queue"
            );
        }

        if !self.remote.initialize_remote().await {
            debug!("remote init reported failure, continuing cycle");
        }

        let snapshot = self.remote.fetch_all().await?;
        let merged = self
            .merge_snapshots(&snapshot, local_clients, local_sessions)
            .await;

        self.notify_sync_complete(&merged);
        self.probe_connection().await;
        Some(merged)
    }

    async fn drain_queue(&self) -> DrainOutcome {
        let mut queue = self.queue.lock().await;
        queue
            .drain(|entry| async move {
                Ok::<bool, SyncError>(self.execute_action(entry.action, &entry.data).await)
            })
            .await
    }

    // ── Individual writes ────────────────────────────────────────

    /// Stages a change in the queue, then attempts an immediate remote
    /// apply when online. The enqueue always happens first so a crash
    /// after this point is still recoverable.
    pub async fn push_change(&self, action: QueueAction, data: Value) -> PushOutcome {
        self.queue.lock().await.enqueue(action, data.clone());

        if self.remote.is_configured() && self.is_online().await {
            if self.execute_action(action, &data).await {
                if let Some(id) = data.get("id").and_then(Value::as_str) {
                    self.queue.lock().await.remove_by_id(id);
                }
                return PushOutcome {
                    success: true,
                    queued: false,
                };
            }
        }

        PushOutcome {
            success: false,
            queued: true,
        }
    }

    /// Records a locally initiated deletion in the tombstone set.
    pub async fn mark_deleted(&self, kind: EntityKind, id: &str) {
        self.queue.lock().await.mark_deleted(kind, id);
    }

    /// Drains the queue outside a full cycle. Returns `None` immediately
    /// when offline or while a cycle is running.
    pub async fn drain_pending(&self) -> Option<DrainOutcome> {
        if !self.is_online().await || self.sync_in_progress() {
            return None;
        }
        let outcome = self.drain_queue().await;
        self.probe_connection().await;
        Some(outcome)
    }

    /// Clears the mutation queue and the tombstone set.
    pub async fn reset(&self) {
        self.queue.lock().await.clear_all();
    }

    /// Dispatches one queued action to the remote adapter. An
    /// unrecognized action is logged and fails rather than panicking.
    pub async fn execute_action(&self, action: QueueAction, data: &Value) -> bool {
        match action {
            QueueAction::SaveClient => self.remote.save_entity(EntityKind::Clients, data).await,
            QueueAction::SaveSession => self.remote.save_entity(EntityKind::Sessions, data).await,
            QueueAction::DeleteClient => self.delete_by_id(EntityKind::Clients, data).await,
            QueueAction::DeleteSession => self.delete_by_id(EntityKind::Sessions, data).await,
            QueueAction::SyncAll => self.remote.sync_all(data).await,
            QueueAction::Unknown => {
                warn!("unrecognized queue action, failing entry");
                false
            }
        }
    }

    async fn delete_by_id(&self, kind: EntityKind, data: &Value) -> bool {
        match data.get("id").and_then(Value::as_str) {
            Some(id) => self.remote.delete_entity(kind, id).await,
            None => {
                warn!(%kind, "delete entry has no id");
                false
            }
        }
    }

    // ── Merge ────────────────────────────────────────────────────

    /// Reconciles a remote snapshot against the local collections,
    /// newer-wins per record, tombstoned ids excluded.
    ///
    /// As a side effect, every local-only or locally-newer record is
    /// enqueued for push, and when online with a non-empty queue a
    /// best-effort drain is scheduled on a spawned task. The scheduled
    /// drain is an accelerator only; the next cycle or an explicit
    /// [`Self::drain_pending`] call covers the same entries.
    pub async fn merge_snapshots(
        &self,
        remote: &RemoteSnapshot,
        local_clients: &[Client],
        local_sessions: &[Session],
    ) -> MergedData {
        let mut queue = self.queue.lock().await;
        let clients = merge_kind(
            &mut queue,
            EntityKind::Clients,
            QueueAction::SaveClient,
            &remote.clients,
            local_clients,
        );
        let sessions = merge_kind(
            &mut queue,
            EntityKind::Sessions,
            QueueAction::SaveSession,
            &remote.sessions,
            local_sessions,
        );
        let has_pending = !queue.is_empty();
        drop(queue);

        if has_pending && self.is_online().await {
            let orchestrator = self.clone();
            tokio::spawn(async move {
                orchestrator.drain_pending().await;
            });
        }

        MergedData { clients, sessions }
    }
}

/// Merges one record kind. The result starts as a copy of the local list;
/// active (non-tombstoned) remote records are appended when unknown
/// locally, or replace the local copy when strictly newer. Ties keep the
/// local record. Local records missing remotely, or strictly newer than
/// their remote counterpart, are enqueued for push against the original
/// (unfiltered) remote list.
fn merge_kind<R>(
    queue: &mut OfflineQueue,
    kind: EntityKind,
    save_action: QueueAction,
    remote: &[R],
    local: &[R],
) -> Vec<R>
where
    R: SyncRecord + Serialize,
{
    let mut merged: Vec<R> = local.to_vec();

    for record in remote {
        if queue.is_tombstoned(kind, record.id()) {
            debug!(%kind, id = record.id(), "remote record is tombstoned, excluding");
            continue;
        }
        match merged.iter().position(|l| l.id() == record.id()) {
            None => merged.push(record.clone()),
            Some(i) => {
                let remote_ts = parse_iso_millis(record.updated_at());
                let local_ts = parse_iso_millis(merged[i].updated_at());
                if remote_ts > local_ts {
                    merged[i] = record.clone();
                }
            }
        }
    }

    for record in local {
        let counterpart = remote.iter().find(|r| r.id() == record.id());
        let needs_push = match counterpart {
            None => true,
            Some(r) => parse_iso_millis(record.updated_at()) > parse_iso_millis(r.updated_at()),
        };
        if needs_push {
            match serde_json::to_value(record) {
                Ok(payload) => queue.enqueue(save_action, payload),
                Err(e) => warn!(%kind, id = record.id(), error = %e, "failed to queue local record"),
            }
        }
    }

    merged
}
