use std::sync::Arc;

use document_store::{DocumentStore, ScriptedStore, StoreError};
use permission_error_channel::{Operation, RecordingHandler};

use super::{doc, item_fields, recorded_channel, Item};
use crate::LiveDocument;

fn setup() -> (ScriptedStore, LiveDocument<Item>, Arc<RecordingHandler>) {
    let store = ScriptedStore::new();
    let (channel, recorder) = recorded_channel();
    let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
    (store, LiveDocument::new(shared, channel), recorder)
}

#[test]
fn null_reference_is_none_and_idle() {
    let (store, live, _) = setup();
    live.bind(None);

    let state = live.state();
    assert_eq!(state.data, None);
    assert!(!state.loading);
    assert_eq!(store.attach_count(), 0);
}

#[test]
fn missing_document_is_not_an_error() {
    let (store, live, recorder) = setup();
    let reference = doc("inventory", "gone");
    live.bind(Some(Arc::clone(&reference)));
    assert!(live.state().loading);

    store.push_document(&reference, None);

    let state = live.state();
    assert_eq!(state.data, None);
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert!(recorder.is_empty());
}

#[test]
fn document_record_carries_id() {
    let (store, live, _) = setup();
    let reference = doc("inventory", "mop");
    live.bind(Some(Arc::clone(&reference)));
    store.push_document(&reference, Some(item_fields("Mop", 3)));

    assert_eq!(
        live.state().data,
        Some(Item {
            id: "mop".into(),
            name: "Mop".into(),
            quantity: 3
        })
    );

    store.push_document(&reference, None);
    assert_eq!(live.state().data, None);
}

#[test]
fn denied_read_reports_get() {
    let (store, live, recorder) = setup();
    let reference = doc("users", "u1");
    live.bind(Some(Arc::clone(&reference)));
    store.fail_document(&reference, || StoreError::PermissionDenied {
        path: "users/u1".into(),
    });

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].operation, Operation::Get);
    assert_eq!(events[0].path, "users/u1");
    assert!(live.state().error.is_some());
}

#[test]
fn switching_documents_detaches_previous() {
    let (store, live, _) = setup();
    let first = doc("users", "a");
    let second = doc("users", "b");
    live.bind(Some(Arc::clone(&first)));
    live.bind(Some(Arc::clone(&second)));

    assert_eq!(store.push_document(&first, Some(item_fields("A", 1))), 0);
    assert_eq!(store.push_document(&second, Some(item_fields("B", 1))), 1);
    assert_eq!(live.state().data.map(|item| item.id), Some("b".to_string()));
    assert_eq!(live.document().map(|d| d.id().to_string()), Some("b".into()));
}
