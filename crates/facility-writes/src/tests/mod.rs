//! Behavioural tests for the write layer.
//!
//! - `writer.rs` - timestamps, rejection reporting, detached writes
//! - `ops.rs`    - validation and domain rules ahead of each write
//! - `seed.rs`   - preconditions, assignment split and atomicity

mod writer;

use std::sync::Arc;

use document_store::{AccessPolicy, DocumentStore, MemoryStore};
use permission_error_channel::{PermissionErrorChannel, RecordingHandler};

use crate::Writer;

pub(crate) struct Harness {
    pub store: MemoryStore,
    pub writer: Writer,
    pub recorder: Arc<RecordingHandler>,
}

pub(crate) fn harness(policy: AccessPolicy) -> Harness {
    let store = MemoryStore::with_policy(policy);
    let channel = PermissionErrorChannel::new();
    let recorder = Arc::new(RecordingHandler::new());
    let sink = Arc::clone(&recorder);
    channel.subscribe(move |error| sink.record(error));

    let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
    Harness {
        store,
        writer: Writer::new(shared, channel),
        recorder,
    }
}
