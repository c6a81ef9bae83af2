use document_store::{Access, AccessPolicy, CollectionRef, DocumentRef};
use permission_error_channel::Operation;
use serde_json::json;

use super::harness;
use crate::WriteError;

#[tokio::test]
async fn create_stamps_both_timestamps() {
    let h = harness(AccessPolicy::allow_all());
    let doc = h
        .writer
        .create(&CollectionRef::new("inventory"), &json!({ "name": "Gloves" }))
        .await
        .unwrap();

    let fields = h.store.fields(&doc).unwrap();
    assert_eq!(fields["name"], "Gloves");
    assert!(fields["createdAt"].is_string());
    assert_eq!(fields["createdAt"], fields["updatedAt"]);
    assert!(h.recorder.is_empty());
}

#[tokio::test]
async fn rejected_create_publishes_once_with_payload() {
    let h = harness(AccessPolicy::allow_all().deny("daily_tasks", Access::Create));
    let payload = json!({ "roomNumber": "A1", "status": "Pending" });

    let err = h
        .writer
        .create(&CollectionRef::new("daily_tasks"), &payload)
        .await
        .unwrap_err();

    let events = h.recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].path, "daily_tasks");
    assert_eq!(events[0].operation, Operation::Create);
    assert_eq!(events[0].request_resource_data, Some(payload));
    assert_eq!(err.permission_error(), Some(&events[0]));
    assert_eq!(h.store.document_count("daily_tasks"), 0);
}

#[tokio::test]
async fn update_stamps_updated_at_only() {
    let h = harness(AccessPolicy::allow_all());
    let doc = DocumentRef::new("inventory", "i1");
    h.store.insert(
        &doc,
        json!({ "name": "Gloves", "quantity": 3 }).as_object().cloned().unwrap(),
    );

    h.writer.update(&doc, &json!({ "quantity": 9 })).await.unwrap();

    let fields = h.store.fields(&doc).unwrap();
    assert_eq!(fields["quantity"], 9);
    assert_eq!(fields["name"], "Gloves");
    assert!(fields["updatedAt"].is_string());
    assert!(!fields.contains_key("createdAt"));
}

#[tokio::test]
async fn rejected_update_reports_document_path() {
    let h = harness(AccessPolicy::allow_all().deny("inventory", Access::Update));
    let doc = DocumentRef::new("inventory", "i1");
    h.store.insert(
        &doc,
        json!({ "quantity": 3 }).as_object().cloned().unwrap(),
    );

    let err = h
        .writer
        .update(&doc, &json!({ "quantity": 1 }))
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::Rejected { .. }));

    let events = h.recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].path, "inventory/i1");
    assert_eq!(events[0].operation, Operation::Update);
    assert_eq!(events[0].request_resource_data, Some(json!({ "quantity": 1 })));
    assert_eq!(h.store.fields(&doc).unwrap()["quantity"], 3);
}

#[tokio::test]
async fn update_of_missing_document_is_reported_too() {
    let h = harness(AccessPolicy::allow_all());
    let err = h
        .writer
        .update(&DocumentRef::new("inventory", "ghost"), &json!({ "quantity": 1 }))
        .await
        .unwrap_err();
    match err {
        WriteError::Rejected { source, .. } => assert!(source.is_not_found()),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(h.recorder.len(), 1);
}

#[tokio::test]
async fn set_reports_as_create() {
    let h = harness(AccessPolicy::allow_all().deny("users", Access::Create));
    let doc = DocumentRef::new("users", "u9");
    assert!(h.writer.set(&doc, &json!({ "name": "X" })).await.is_err());

    let events = h.recorder.events();
    assert_eq!(events[0].path, "users/u9");
    assert_eq!(events[0].operation, Operation::Create);
}

#[tokio::test]
async fn non_object_payload_is_not_sent() {
    let h = harness(AccessPolicy::allow_all());
    let err = h
        .writer
        .create(&CollectionRef::new("inventory"), &json!([1, 2]))
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::Encode(_)));
    assert!(h.recorder.is_empty());
    assert_eq!(h.store.document_count("inventory"), 0);
}

#[tokio::test]
async fn spawned_writes_report_through_channel() {
    let h = harness(AccessPolicy::allow_all().deny("inventory", Access::Create));
    let handle = h
        .writer
        .spawn_create(CollectionRef::new("inventory"), json!({ "name": "Mops" }));

    // The caller moves on; the outcome still lands on the channel.
    let result = handle.await.unwrap();
    assert!(result.is_err());
    assert_eq!(h.recorder.len(), 1);

    let ok = harness(AccessPolicy::allow_all());
    let doc = DocumentRef::new("inventory", "i1");
    ok.store
        .insert(&doc, json!({ "quantity": 1 }).as_object().cloned().unwrap());
    ok.writer
        .spawn_update(doc.clone(), json!({ "quantity": 2 }))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ok.store.fields(&doc).unwrap()["quantity"], 2);
}
