//! The two synchronized record kinds and the narrow trait the merge
//! algorithm sees them through.
//!
//! Field names serialize in camelCase to match the remote wire format.
//! The sync core treats every domain field as opaque except `notes`, which
//! the transport layer may truncate to fit its URL budget.

use crate::timestamp::now_iso;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The record collections the sync layer reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Clients,
    Sessions,
}

impl EntityKind {
    /// The remote action name that saves one record of this kind.
    #[must_use]
    pub const fn save_action(self) -> &'static str {
        match self {
            Self::Clients => "saveClient",
            Self::Sessions => "saveSession",
        }
    }

    /// The remote action name that deletes one record of this kind.
    #[must_use]
    pub const fn delete_action(self) -> &'static str {
        match self {
            Self::Clients => "deleteClient",
            Self::Sessions => "deleteSession",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clients => write!(f, "clients"),
            Self::Sessions => write!(f, "sessions"),
        }
    }
}

/// What the merge algorithm needs from a record: a stable identifier and
/// the last-write timestamp that decides conflicts.
pub trait SyncRecord: Clone {
    /// The record's immutable, globally unique identifier.
    fn id(&self) -> &str;

    /// The RFC 3339 timestamp of the last write, local or remote.
    fn updated_at(&self) -> &str;

    /// Stamps the record as modified now.
    fn touch(&mut self);
}

/// A practice client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
    pub rate: f64,
    pub currency: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Client {
    /// Creates a new client with a fresh id and creation timestamp.
    #[must_use]
    pub fn new(name: impl Into<String>, rate: f64, currency: impl Into<String>) -> Self {
        let now = now_iso();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            rate,
            currency: currency.into(),
            notes: String::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl SyncRecord for Client {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = now_iso();
    }
}

/// A billable session belonging to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub client_id: String,
    pub date: String,
    pub amount: f64,
    pub paid: bool,
    #[serde(default)]
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Session {
    /// Creates a new session for a client with a fresh id and timestamps.
    #[must_use]
    pub fn new(client_id: impl Into<String>, date: impl Into<String>, amount: f64) -> Self {
        let now = now_iso();
        Self {
            id: Uuid::new_v4().to_string(),
            client_id: client_id.into(),
            date: date.into(),
            amount,
            paid: false,
            notes: String::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

impl SyncRecord for Session {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> &str {
        &self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = now_iso();
    }
}
