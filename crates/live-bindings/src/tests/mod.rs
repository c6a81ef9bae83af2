//! Behavioural tests for the live bindings.
//!
//! - `query.rs`    - query binding lifecycle, replacement and errors
//! - `document.rs` - document binding, missing documents and errors
//! - `memory.rs`   - both bindings against the in-memory store

mod document;

use std::sync::Arc;

use document_store::{CollectionRef, DocumentRef, DocumentSnapshot, Fields, QuerySnapshot};
use permission_error_channel::{PermissionErrorChannel, RecordingHandler};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Item {
    pub id: String,
    pub name: String,
    pub quantity: u32,
}

pub(crate) fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub(crate) fn item_fields(name: &str, quantity: u32) -> Fields {
    fields(json!({ "name": name, "quantity": quantity }))
}

pub(crate) fn snapshot(collection: &str, docs: &[(&str, Fields)]) -> QuerySnapshot {
    let collection = CollectionRef::new(collection);
    QuerySnapshot::new(
        docs.iter()
            .map(|(id, fields)| DocumentSnapshot::new(collection.doc(*id), Some(fields.clone())))
            .collect(),
    )
}

pub(crate) fn doc(collection: &str, id: &str) -> Arc<DocumentRef> {
    Arc::new(DocumentRef::new(collection, id))
}

/// A channel with a recorder attached.
pub(crate) fn recorded_channel() -> (PermissionErrorChannel, Arc<RecordingHandler>) {
    let channel = PermissionErrorChannel::new();
    let recorder = Arc::new(RecordingHandler::new());
    let sink = Arc::clone(&recorder);
    channel.subscribe(move |err| sink.record(err));
    (channel, recorder)
}

pub(crate) fn ids(items: &[Item]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}
