use praxis_types::{parse_iso_millis, Client, EntityKind, Session, SyncRecord};
use pretty_assertions::assert_eq;
use serde_json::json;

// ── Wire format ──────────────────────────────────────────────────

#[test]
fn client_serializes_camel_case() {
    let client = Client::new("Ada", 120.0, "EUR");
    let value = serde_json::to_value(&client).unwrap();

    assert!(value.get("createdAt").is_some());
    assert!(value.get("updatedAt").is_some());
    assert!(value.get("created_at").is_none());
    assert_eq!(value["name"], "Ada");
    assert_eq!(value["rate"], 120.0);
    assert_eq!(value["currency"], "EUR");
}

#[test]
fn session_serializes_camel_case() {
    let session = Session::new("c1", "2024-03-01", 90.0);
    let value = serde_json::to_value(&session).unwrap();

    assert_eq!(value["clientId"], "c1");
    assert!(value.get("createdAt").is_some());
    assert!(value.get("updatedAt").is_some());
    assert_eq!(value["paid"], false);
}

#[test]
fn client_deserializes_wire_payload() {
    let client: Client = serde_json::from_value(json!({
        "id": "c1",
        "name": "Remote",
        "rate": 80.5,
        "currency": "USD",
        "notes": "weekly",
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-02T00:00:00Z"
    }))
    .unwrap();

    assert_eq!(client.id, "c1");
    assert_eq!(client.rate, 80.5);
    assert_eq!(client.updated_at, "2024-01-02T00:00:00Z");
}

#[test]
fn missing_notes_defaults_empty() {
    let session: Session = serde_json::from_value(json!({
        "id": "s1",
        "clientId": "c1",
        "date": "2024-03-01",
        "amount": 90.0,
        "paid": true,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    }))
    .unwrap();

    assert_eq!(session.notes, "");
    assert!(session.paid);
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn new_client_gets_fresh_id_and_timestamps() {
    let a = Client::new("Ada", 100.0, "EUR");
    let b = Client::new("Ada", 100.0, "EUR");

    assert_ne!(a.id, b.id);
    assert_eq!(a.created_at, a.updated_at);
    assert!(parse_iso_millis(&a.updated_at) > 0);
}

#[test]
fn touch_advances_updated_at() {
    let mut client = Client::new("Ada", 100.0, "EUR");
    let created = client.created_at.clone();
    let before = parse_iso_millis(&client.updated_at);
    client.touch();
    assert!(parse_iso_millis(&client.updated_at) >= before);
    assert_eq!(client.created_at, created);
}

// ── EntityKind ───────────────────────────────────────────────────

#[test]
fn entity_kind_action_names() {
    assert_eq!(EntityKind::Clients.save_action(), "saveClient");
    assert_eq!(EntityKind::Clients.delete_action(), "deleteClient");
    assert_eq!(EntityKind::Sessions.save_action(), "saveSession");
    assert_eq!(EntityKind::Sessions.delete_action(), "deleteSession");
}

#[test]
fn entity_kind_display() {
    assert_eq!(EntityKind::Clients.to_string(), "clients");
    assert_eq!(EntityKind::Sessions.to_string(), "sessions");
}

// ── SyncRecord trait ─────────────────────────────────────────────

#[test]
fn sync_record_exposes_id_and_timestamp() {
    let session = Session::new("c1", "2024-03-01", 50.0);
    assert_eq!(SyncRecord::id(&session), session.id.as_str());
    assert_eq!(SyncRecord::updated_at(&session), session.updated_at.as_str());
}
