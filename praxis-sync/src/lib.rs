//! Offline-first synchronization core for the praxis practice ledger.
//!
//! Keeps the two local collections (clients, sessions) consistent with a
//! remote key-value store reachable only through constrained HTTP GET
//! requests. Built from three parts:
//!
//! - **Offline queue**: a durable, deduplicated list of pending mutations
//!   plus a tombstone set of locally deleted record ids
//! - **Remote adapter**: one GET request per logical operation, with a
//!   two-stage truncation policy for oversized payloads
//! - **Orchestrator**: connection tracking, the guarded
//!   probe → drain → fetch → merge → notify cycle, and push-with-fallback
//!   for individual writes
//!
//! # Failure model
//!
//! No public operation here returns an error. Transport failures collapse
//! to `false`/`None` sentinels at the adapter boundary, persistence
//! failures are logged and swallowed at the queue boundary, and listener
//! panics are isolated per callback. The caller decides what to surface.
//!
//! # Example
//!
//! ```no_run
//! use praxis_storage::MemoryStore;
//! use praxis_sync::{RemoteAdapter, SyncOrchestrator};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let remote = RemoteAdapter::new("https://sync.example.test/api");
//! let orchestrator = SyncOrchestrator::new(remote, Arc::new(MemoryStore::new()));
//!
//! orchestrator.on_connection_change(|online, status| {
//!     println!("{status} (online: {online})");
//! });
//!
//! if orchestrator.probe_connection().await {
//!     let merged = orchestrator.run_sync_cycle(&[], &[]).await;
//!     println!("merged: {merged:?}");
//! }
//! # }
//! ```

mod error;
mod orchestrator;
mod queue;
mod remote;

pub use error::{SyncError, SyncResult};
pub use orchestrator::{
    ConnectionStatus, MergedData, PushOutcome, SyncOrchestrator,
};
pub use queue::{DrainOutcome, OfflineQueue, QUEUE_KEY, TOMBSTONES_KEY};
pub use remote::{
    RemoteAdapter, RemoteSnapshot, DEFAULT_MAX_REQUEST_LEN, NOTES_LIMIT, NOTES_LIMIT_TIGHT,
};
