//! Core type definitions for the praxis sync layer.
//!
//! This crate defines the types shared between the storage and sync crates:
//! - The two synchronized record kinds (`Client`, `Session`)
//! - The offline queue entry and action vocabulary
//! - ISO-8601 timestamp helpers used for conflict resolution
//!
//! Everything UI-facing (display formatting, currency rendering, view
//! models) belongs to the consuming application, not here.

mod queue;
mod records;
mod timestamp;

pub use queue::{QueueAction, QueueEntry};
pub use records::{Client, EntityKind, Session, SyncRecord};
pub use timestamp::{now_iso, parse_iso_millis};
