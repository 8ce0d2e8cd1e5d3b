//! Offline queue vocabulary.
//!
//! A queue entry captures one pending mutation: the remote action to
//! perform, the record payload as opaque JSON, and the time it was queued.

use crate::timestamp::now_iso;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// The mutations the remote store understands.
///
/// Serialized names are the remote wire names. `Unknown` absorbs action
/// names we do not recognize when loading a persisted queue from an older
/// or corrupted snapshot; dispatch fails those entries instead of panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    SaveClient,
    SaveSession,
    DeleteClient,
    DeleteSession,
    SyncAll,
    Unknown,
}

impl QueueAction {
    /// The wire name sent to the remote store.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::SaveClient => "saveClient",
            Self::SaveSession => "saveSession",
            Self::DeleteClient => "deleteClient",
            Self::DeleteSession => "deleteSession",
            Self::SyncAll => "syncAll",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a wire name back to an action; anything unrecognized becomes
    /// [`QueueAction::Unknown`].
    #[must_use]
    pub fn from_wire_name(name: &str) -> Self {
        match name {
            "saveClient" => Self::SaveClient,
            "saveSession" => Self::SaveSession,
            "deleteClient" => Self::DeleteClient,
            "deleteSession" => Self::DeleteSession,
            "syncAll" => Self::SyncAll,
            _ => Self::Unknown,
        }
    }
}

impl Serialize for QueueAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for QueueAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_wire_name(&name))
    }
}

impl fmt::Display for QueueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// One pending mutation in the offline queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub action: QueueAction,
    pub data: Value,
    pub timestamp: String,
}

impl QueueEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(action: QueueAction, data: Value) -> Self {
        Self {
            action,
            data,
            timestamp: now_iso(),
        }
    }

    /// The id of the record this entry mutates, if the payload carries one.
    ///
    /// Full-sync payloads have no single id and return `None`; such entries
    /// are never deduplicated against each other.
    #[must_use]
    pub fn entry_id(&self) -> Option<&str> {
        self.data.get("id").and_then(Value::as_str)
    }
}
