//! Behavioural tests for the session binding.
//!
//! - `session.rs` - state transitions driven by identity and profile
//! - `login.rs`   - form validation and first-sign-in provisioning

mod session;

use std::sync::Arc;

use document_store::{DocumentRef, Fields};
use permission_error_channel::{PermissionErrorChannel, RecordingHandler};
use serde_json::json;

use crate::MemoryIdentityProvider;

pub(crate) fn profile_fields(uid: &str, name: &str, role: &str) -> Fields {
    match json!({
        "id": uid,
        "name": name,
        "email": format!("{uid}@example.com"),
        "role": role,
        "avatarUrl": "",
    }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    }
}

pub(crate) fn profile_ref(uid: &str) -> DocumentRef {
    DocumentRef::new(crate::USERS_COLLECTION, uid)
}

pub(crate) fn provider() -> Arc<MemoryIdentityProvider> {
    Arc::new(
        MemoryIdentityProvider::new()
            .with_account("admin@example.com", "secret", "admin-id")
            .with_account("stranger@example.com", "secret", "stranger-id"),
    )
}

pub(crate) fn recorded_channel() -> (PermissionErrorChannel, Arc<RecordingHandler>) {
    let channel = PermissionErrorChannel::new();
    let recorder = Arc::new(RecordingHandler::new());
    let sink = Arc::clone(&recorder);
    channel.subscribe(move |error| sink.record(error));
    (channel, recorder)
}
