use praxis_types::{parse_iso_millis, QueueAction, QueueEntry};
use serde_json::json;

// ── Action wire names ────────────────────────────────────────────

#[test]
fn action_wire_names_round_trip() {
    for action in [
        QueueAction::SaveClient,
        QueueAction::SaveSession,
        QueueAction::DeleteClient,
        QueueAction::DeleteSession,
        QueueAction::SyncAll,
    ] {
        assert_eq!(QueueAction::from_wire_name(action.wire_name()), action);
    }
}

#[test]
fn unrecognized_action_becomes_unknown() {
    assert_eq!(QueueAction::from_wire_name("dropTables"), QueueAction::Unknown);
    assert_eq!(QueueAction::from_wire_name(""), QueueAction::Unknown);
}

#[test]
fn action_serde_uses_wire_names() {
    let json = serde_json::to_string(&QueueAction::SaveClient).unwrap();
    assert_eq!(json, "\"saveClient\"");

    let action: QueueAction = serde_json::from_str("\"deleteSession\"").unwrap();
    assert_eq!(action, QueueAction::DeleteSession);
}

#[test]
fn corrupt_persisted_action_deserializes_as_unknown() {
    let action: QueueAction = serde_json::from_str("\"whatIsThis\"").unwrap();
    assert_eq!(action, QueueAction::Unknown);
}

// ── Entries ──────────────────────────────────────────────────────

#[test]
fn new_entry_captures_timestamp() {
    let entry = QueueEntry::new(QueueAction::SaveClient, json!({ "id": "c1" }));
    assert!(parse_iso_millis(&entry.timestamp) > 0);
}

#[test]
fn entry_id_extracts_string_id() {
    let entry = QueueEntry::new(QueueAction::SaveClient, json!({ "id": "c1", "name": "Ada" }));
    assert_eq!(entry.entry_id(), Some("c1"));
}

#[test]
fn entry_id_absent_for_full_sync_payloads() {
    let entry = QueueEntry::new(QueueAction::SyncAll, json!({ "clients": [], "sessions": [] }));
    assert_eq!(entry.entry_id(), None);

    // A non-string id is not an id.
    let entry = QueueEntry::new(QueueAction::SaveClient, json!({ "id": 42 }));
    assert_eq!(entry.entry_id(), None);
}

#[test]
fn entry_serde_round_trip() {
    let entry = QueueEntry::new(QueueAction::DeleteClient, json!({ "id": "c9" }));
    let raw = serde_json::to_string(&entry).unwrap();
    let back: QueueEntry = serde_json::from_str(&raw).unwrap();
    assert_eq!(back, entry);
}
