//! Remote client adapter.
//!
//! The remote store is reachable only through idempotent HTTP GET requests
//! of the form `{endpoint}?action={name}&data={urlencoded json}`, with a
//! hard length budget on the fully encoded request and no chunking. The
//! adapter translates each logical operation into one such request and
//! collapses every failure to a sentinel (`false` / `None`); nothing here
//! propagates an error past the public surface.

use crate::error::{SyncError, SyncResult};
use praxis_types::{Client, EntityKind, Session};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Character budget for a `notes` field before encoding.
pub const NOTES_LIMIT: usize = 500;
/// Tighter budget applied when the encoded request still exceeds the
/// transport limit after the first truncation.
pub const NOTES_LIMIT_TIGHT: usize = 200;
/// Default hard limit on the fully encoded request, in characters.
pub const DEFAULT_MAX_REQUEST_LEN: usize = 1800;

/// Marker appended to a truncated `notes` field.
const TRUNCATION_MARKER: &str = "...";

/// The full remote snapshot returned by `getData`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteSnapshot {
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default, rename = "syncedAt")]
    pub synced_at: Option<String>,
}

/// Minimal view of any remote response: only the error field matters for
/// success classification.
#[derive(Debug, Deserialize)]
struct RemoteStatus {
    #[serde(default)]
    error: Option<String>,
}

/// GET-only adapter for the remote key-value store.
pub struct RemoteAdapter {
    endpoint: String,
    max_request_len: usize,
    client: HttpClient,
}

impl RemoteAdapter {
    /// Creates an adapter for `endpoint`. An empty endpoint leaves the
    /// adapter unconfigured; every operation then fails its sentinel way.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create HTTP client");

        Self {
            endpoint: endpoint.into(),
            max_request_len: DEFAULT_MAX_REQUEST_LEN,
            client,
        }
    }

    /// Overrides the transport length budget.
    #[must_use]
    pub fn with_max_request_len(mut self, max_request_len: usize) -> Self {
        self.max_request_len = max_request_len;
        self
    }

    /// True iff a non-empty endpoint URL is set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }

    /// The configured endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    // ── Operations ───────────────────────────────────────────────

    /// Lightweight reachability probe. True only when the transport
    /// reports a successful status; every error collapses to false.
    pub async fn ping(&self) -> bool {
        if !self.is_configured() {
            return false;
        }
        match self.client.get(self.build_url("ping", None)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "ping failed");
                false
            }
        }
    }

    /// Idempotent remote-side schema setup. Returns false only when the
    /// remote explicitly reports failure; a transport error is logged and
    /// reported as true, since the subsequent fetch will fail the cycle
    /// anyway if the remote is truly unreachable.
    pub async fn initialize_remote(&self) -> bool {
        match self.get_json(&self.build_url("init", None)).await {
            Ok(body) => match serde_json::from_value::<RemoteStatus>(body) {
                Ok(RemoteStatus { error: Some(e) }) => {
                    warn!(error = %e, "remote init rejected");
                    false
                }
                _ => true,
            },
            Err(e) => {
                debug!(error = %e, "remote init unreachable");
                true
            }
        }
    }

    /// Retrieves the full remote snapshot. `None` means "merge not
    /// possible this cycle": network failure, malformed response, or an
    /// explicit error field all land here.
    pub async fn fetch_all(&self) -> Option<RemoteSnapshot> {
        let body = match self.get_json(&self.build_url("getData", None)).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "failed to fetch remote snapshot");
                return None;
            }
        };

        if let Some(error) = body.get("error").and_then(Value::as_str) {
            warn!(error, "remote rejected getData");
            return None;
        }

        match serde_json::from_value(body) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "malformed remote snapshot");
                None
            }
        }
    }

    /// Saves one record. The payload's `notes` field is truncated to fit
    /// the transport budget (see module docs); if the encoded request
    /// cannot be brought under budget the operation fails without sending.
    pub async fn save_entity(&self, kind: EntityKind, record: &Value) -> bool {
        let Some(url) = self.encode_with_budget(kind.save_action(), record) else {
            return false;
        };
        self.send_action(&url).await
    }

    /// Deletes one record by id.
    pub async fn delete_entity(&self, kind: EntityKind, id: &str) -> bool {
        let data = serde_json::json!({ "id": id });
        let Some(url) = self.encode_with_budget(kind.delete_action(), &data) else {
            return false;
        };
        self.send_action(&url).await
    }

    /// Pushes a full-sync payload in one request. Subject to the same
    /// transport budget; there is no chunking fallback.
    pub async fn sync_all(&self, payload: &Value) -> bool {
        let Some(url) = self.encode_with_budget("syncAll", payload) else {
            return false;
        };
        self.send_action(&url).await
    }

    // ── Request building ─────────────────────────────────────────

    fn build_url(&self, action: &str, data: Option<&str>) -> String {
        match data {
            Some(data) => format!(
                "{}?action={}&data={}",
                self.endpoint,
                action,
                urlencoding::encode(data)
            ),
            None => format!("{}?action={}", self.endpoint, action),
        }
    }

    /// Encodes `action` + `data` into a GET URL under the transport
    /// budget, truncating `notes` in two stages. Returns `None` when the
    /// request cannot fit; nothing malformed is ever sent.
    fn encode_with_budget(&self, action: &str, data: &Value) -> Option<String> {
        if !self.is_configured() {
            return None;
        }

        let mut payload = data.clone();
        truncate_notes(&mut payload, NOTES_LIMIT);
        let url = self.build_url(action, Some(&payload.to_string()));
        if url.chars().count() <= self.max_request_len {
            return Some(url);
        }

        truncate_notes(&mut payload, NOTES_LIMIT_TIGHT);
        let url = self.build_url(action, Some(&payload.to_string()));
        if url.chars().count() <= self.max_request_len {
            return Some(url);
        }

        warn!(
            action,
            len = url.chars().count(),
            budget = self.max_request_len,
            "request exceeds transport budget even after truncation, not sending"
        );
        None
    }

    // ── Transport ────────────────────────────────────────────────

    async fn get_json(&self, url: &str) -> SyncResult<Value> {
        if !self.is_configured() {
            return Err(SyncError::Network("no endpoint configured".to_string()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SyncError::Network(format!(
                "remote returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SyncError::Network(format!("failed to read response body: {e}")))?;

        Ok(serde_json::from_str(&body)?)
    }

    /// Sends one mutation request; true only on a successful status with
    /// a JSON body carrying no error field.
    async fn send_action(&self, url: &str) -> bool {
        match self.get_json(url).await {
            Ok(body) => match serde_json::from_value::<RemoteStatus>(body) {
                Ok(RemoteStatus { error: Some(e) }) => {
                    warn!(error = %e, "remote rejected mutation");
                    false
                }
                Ok(RemoteStatus { error: None }) => true,
                Err(e) => {
                    warn!(error = %e, "unreadable mutation response");
                    false
                }
            },
            Err(e) => {
                warn!(error = %e, "mutation request failed");
                false
            }
        }
    }
}

/// Truncates a `notes` string field to `limit` characters, appending the
/// truncation marker when anything was cut. Payloads without a string
/// `notes` field are left untouched.
fn truncate_notes(data: &mut Value, limit: usize) {
    let Some(notes) = data.get("notes").and_then(Value::as_str) else {
        return;
    };
    if notes.chars().count() <= limit {
        return;
    }
    let truncated: String = notes.chars().take(limit).collect();
    data["notes"] = Value::String(format!("{truncated}{TRUNCATION_MARKER}"));
}
