use std::sync::Arc;

use document_store::{Access, AccessPolicy, DocumentStore, MemoryStore, ScriptedStore};
use facility_model::UserRole;
use permission_error_channel::Operation;

use super::{profile_fields, profile_ref, provider, recorded_channel};
use crate::{IdentityProvider, SessionBinding, SessionState};

#[tokio::test]
async fn signed_out_provider_resolves_to_anonymous() {
    let (channel, _) = recorded_channel();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let session = SessionBinding::start(provider(), store, channel);

    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(!session.state().loading());
    assert!(!session.state().is_authenticated());
}

#[tokio::test]
async fn sign_in_waits_for_profile() {
    let (channel, _) = recorded_channel();
    let scripted = ScriptedStore::new();
    let store: Arc<dyn DocumentStore> = Arc::new(scripted.clone());
    let identity = provider();
    let session = SessionBinding::start(identity.clone(), store, channel);

    identity.sign_in("admin@example.com", "secret").await.unwrap();
    let state = session.state();
    assert!(matches!(state, SessionState::LoadingProfile { .. }));
    assert!(state.loading());
    assert!(!state.is_authenticated());

    scripted.push_document(
        &profile_ref("admin-id"),
        Some(profile_fields("admin-id", "Nicholas Kelly", "Admin")),
    );
    let state = session.state();
    assert!(state.is_authenticated());
    assert!(!state.loading());
    assert_eq!(state.user().map(|u| u.role), Some(UserRole::Admin));
    assert_eq!(state.identity().map(|i| i.uid.as_str()), Some("admin-id"));
}

#[tokio::test]
async fn missing_profile_is_not_authenticated() {
    let (channel, recorder) = recorded_channel();
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let identity = provider();
    let session = SessionBinding::start(identity.clone(), store, channel);

    identity.sign_in("stranger@example.com", "secret").await.unwrap();
    let state = session.state();
    assert!(matches!(state, SessionState::ProfileMissing { .. }));
    assert!(!state.loading());
    assert!(!state.is_authenticated());
    assert!(recorder.is_empty());
}

#[tokio::test]
async fn profile_arriving_later_authenticates() {
    let (channel, _) = recorded_channel();
    let memory = MemoryStore::new();
    let store: Arc<dyn DocumentStore> = Arc::new(memory.clone());
    let identity = provider();
    let session = SessionBinding::start(identity.clone(), store, channel);

    identity.sign_in("stranger@example.com", "secret").await.unwrap();
    assert!(matches!(session.state(), SessionState::ProfileMissing { .. }));

    memory.insert(
        &profile_ref("stranger-id"),
        profile_fields("stranger-id", "New User", "Housekeeper"),
    );
    assert_eq!(
        session.user().map(|u| u.name),
        Some("New User".to_string())
    );
}

#[tokio::test]
async fn denied_profile_publishes_and_leaves_session_unauthenticated() {
    let (channel, recorder) = recorded_channel();
    let memory = MemoryStore::with_policy(AccessPolicy::allow_all().deny("users", Access::Get));
    let store: Arc<dyn DocumentStore> = Arc::new(memory);
    let identity = provider();
    let session = SessionBinding::start(identity.clone(), store, channel);

    identity.sign_in("admin@example.com", "secret").await.unwrap();
    assert!(matches!(session.state(), SessionState::ProfileMissing { .. }));

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].path, "users/admin-id");
    assert_eq!(events[0].operation, Operation::Get);
}

#[tokio::test]
async fn sign_out_detaches_profile() {
    let (channel, _) = recorded_channel();
    let scripted = ScriptedStore::new();
    let store: Arc<dyn DocumentStore> = Arc::new(scripted.clone());
    let identity = provider();
    let session = SessionBinding::start(identity.clone(), store, channel);

    identity.sign_in("admin@example.com", "secret").await.unwrap();
    scripted.push_document(
        &profile_ref("admin-id"),
        Some(profile_fields("admin-id", "Nicholas Kelly", "Admin")),
    );
    assert!(session.state().is_authenticated());
    assert_eq!(scripted.active_listeners(), 1);

    session.sign_out().await.unwrap();
    assert_eq!(session.state(), SessionState::Anonymous);
    assert_eq!(scripted.active_listeners(), 0);

    // A late delivery for the old account changes nothing.
    assert_eq!(
        scripted.push_document(
            &profile_ref("admin-id"),
            Some(profile_fields("admin-id", "Nicholas Kelly", "Admin")),
        ),
        0
    );
    assert_eq!(session.state(), SessionState::Anonymous);
}

#[tokio::test]
async fn switching_accounts_rebinds_once() {
    let (channel, _) = recorded_channel();
    let memory = MemoryStore::new();
    memory.insert(
        &profile_ref("admin-id"),
        profile_fields("admin-id", "Nicholas Kelly", "Admin"),
    );
    memory.insert(
        &profile_ref("stranger-id"),
        profile_fields("stranger-id", "Guest", "Nurse"),
    );
    let store: Arc<dyn DocumentStore> = Arc::new(memory.clone());
    let identity = provider();
    let session = SessionBinding::start(identity.clone(), store, channel);

    identity.sign_in("admin@example.com", "secret").await.unwrap();
    assert_eq!(session.user().map(|u| u.role), Some(UserRole::Admin));

    identity.sign_in("stranger@example.com", "secret").await.unwrap();
    assert_eq!(session.user().map(|u| u.role), Some(UserRole::Nurse));
    assert_eq!(memory.listener_count(), 1);
}

#[tokio::test]
async fn resolved_waits_past_loading() {
    let (channel, _) = recorded_channel();
    let scripted = ScriptedStore::new();
    let store: Arc<dyn DocumentStore> = Arc::new(scripted.clone());
    let identity = provider();
    let session = Arc::new(SessionBinding::start(identity.clone(), store, channel));
    identity.sign_in("admin@example.com", "secret").await.unwrap();

    let waiter = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.resolved().await })
    };
    tokio::task::yield_now().await;
    scripted.push_document(&profile_ref("admin-id"), None);

    let state = waiter.await.unwrap();
    assert!(matches!(state, SessionState::ProfileMissing { .. }));
}

#[tokio::test]
async fn dropping_session_detaches_listeners() {
    let (channel, _) = recorded_channel();
    let memory = MemoryStore::new();
    let store: Arc<dyn DocumentStore> = Arc::new(memory.clone());
    let identity = provider();
    let session = SessionBinding::start(identity.clone(), store, channel);
    identity.sign_in("admin@example.com", "secret").await.unwrap();
    assert_eq!(memory.listener_count(), 1);

    drop(session);
    assert_eq!(memory.listener_count(), 0);
    // The provider no longer calls back into the dropped session.
    identity.sign_out().await.unwrap();
}
