//! In-process store with access rules.
//!
//! Writes commit under one lock; listeners of touched collections and
//! documents are then called with fresh snapshots after the lock is
//! released, in commit order. A listener may write back into the store from
//! its callback.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::{Mutex, ReentrantMutex};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult};
use crate::listener::{DocumentListener, ListenerRegistration, QueryListener};
use crate::reference::{CollectionRef, Direction, DocumentRef, Query};
use crate::snapshot::{DocumentSnapshot, Fields, QuerySnapshot};
use crate::store::DocumentStore;
use crate::write::{WriteBatch, WriteData, WriteOp};

/// Request kinds an [`AccessPolicy`] can deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Get,
    List,
    Create,
    Update,
}

impl Access {
    pub const ALL: [Access; 4] = [Self::Get, Self::List, Self::Create, Self::Update];
}

/// Deny rules per collection. Everything not denied is allowed.
///
/// The collection name `*` matches every collection.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    denied: HashSet<(String, Access)>,
}

impl AccessPolicy {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn deny(mut self, collection: impl Into<String>, access: Access) -> Self {
        self.denied.insert((collection.into(), access));
        self
    }

    /// Deny reads and writes on `collection`.
    pub fn deny_collection(mut self, collection: impl Into<String>) -> Self {
        let collection = collection.into();
        for access in Access::ALL {
            self.denied.insert((collection.clone(), access));
        }
        self
    }

    pub fn permits(&self, collection: &str, access: Access) -> bool {
        !self.denied.contains(&(collection.to_string(), access))
            && !self.denied.contains(&("*".to_string(), access))
    }
}

struct QueryWatch {
    id: u64,
    query: Query,
    listener: QueryListener,
}

struct DocumentWatch {
    id: u64,
    doc: DocumentRef,
    listener: DocumentListener,
}

enum Delivery {
    Query(QueryListener, Result<QuerySnapshot, StoreError>),
    Document(DocumentListener, Result<DocumentSnapshot, StoreError>),
}

impl Delivery {
    fn run(self) {
        match self {
            Self::Query(listener, result) => listener(result),
            Self::Document(listener, result) => listener(result),
        }
    }
}

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

#[derive(Default)]
struct State {
    collections: Collections,
    policy: AccessPolicy,
    query_watches: Vec<QueryWatch>,
    document_watches: Vec<DocumentWatch>,
    next_watch_id: u64,
    last_commit_micros: i64,
}

impl State {
    /// Commit time, strictly increasing across commits.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let micros = Utc::now()
            .timestamp_micros()
            .max(self.last_commit_micros + 1);
        self.last_commit_micros = micros;
        DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
    }

    fn document(&self, doc: &DocumentRef) -> DocumentSnapshot {
        let fields = self
            .collections
            .get(doc.collection().name())
            .and_then(|docs| docs.get(doc.id()))
            .cloned();
        DocumentSnapshot::new(doc.clone(), fields)
    }

    fn evaluate(&self, query: &Query) -> QuerySnapshot {
        let collection = query.collection();
        let Some(docs) = self.collections.get(collection.name()) else {
            return QuerySnapshot::default();
        };

        let mut matches: Vec<(&String, &Fields)> = docs
            .iter()
            .filter(|(_, fields)| {
                query
                    .filters()
                    .iter()
                    .all(|filter| fields.get(&filter.field) == Some(&filter.value))
            })
            .collect();

        if let Some(order) = query.ordering() {
            matches.retain(|(_, fields)| fields.contains_key(&order.field));
            matches.sort_by(|(_, a), (_, b)| {
                let ord = compare_values(&a[&order.field], &b[&order.field]);
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        QuerySnapshot::new(
            matches
                .into_iter()
                .map(|(id, fields)| DocumentSnapshot::new(collection.doc(id), Some(fields.clone())))
                .collect(),
        )
    }

    /// Snapshots owed to listeners after `touched` changed. Query listeners
    /// that lost read access get a final error and are dropped.
    fn deliveries_for(&mut self, touched: &BTreeSet<DocumentRef>) -> Vec<Delivery> {
        let mut out = Vec::new();

        let watches = std::mem::take(&mut self.query_watches);
        for watch in watches {
            let affected = touched
                .iter()
                .any(|doc| doc.collection() == watch.query.collection());
            if !affected {
                self.query_watches.push(watch);
                continue;
            }
            if self.policy.permits(watch.query.path(), Access::List) {
                let snapshot = self.evaluate(&watch.query);
                out.push(Delivery::Query(Arc::clone(&watch.listener), Ok(snapshot)));
                self.query_watches.push(watch);
            } else {
                let error = StoreError::PermissionDenied {
                    path: watch.query.path().to_string(),
                };
                out.push(Delivery::Query(watch.listener, Err(error)));
            }
        }

        for watch in &self.document_watches {
            if touched.contains(&watch.doc) {
                out.push(Delivery::Document(
                    Arc::clone(&watch.listener),
                    Ok(self.document(&watch.doc)),
                ));
            }
        }

        out
    }

    fn detach(&mut self, id: u64) {
        self.query_watches.retain(|w| w.id != id);
        self.document_watches.retain(|w| w.id != id);
    }
}

struct Inner {
    state: Mutex<State>,
    /// Serializes commit-then-deliver so listeners see commits in order.
    delivery: ReentrantMutex<()>,
}

/// Process-local [`DocumentStore`].
///
/// Server timestamps are RFC 3339 strings with microsecond precision, so
/// they order correctly as strings. Cloning shares the same data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_policy(AccessPolicy::allow_all())
    }

    pub fn with_policy(policy: AccessPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    policy,
                    ..State::default()
                }),
                delivery: ReentrantMutex::new(()),
            }),
        }
    }

    /// Replace the access rules. Applies to the next request.
    pub fn set_policy(&self, policy: AccessPolicy) {
        self.inner.state.lock().policy = policy;
    }

    /// Write a document without checking access rules. Listeners are
    /// notified as for any other write.
    pub fn insert(&self, doc: &DocumentRef, fields: Fields) {
        let op = WriteOp::Set {
            doc: doc.clone(),
            data: WriteData::new(fields),
        };
        if let Err(e) = self.apply(vec![op], false) {
            debug!(error = %e, "unchecked insert failed");
        }
    }

    /// Current fields of a document, bypassing access rules.
    pub fn fields(&self, doc: &DocumentRef) -> Option<Fields> {
        self.inner.state.lock().document(doc).fields().cloned()
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.inner
            .state
            .lock()
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn listener_count(&self) -> usize {
        let state = self.inner.state.lock();
        state.query_watches.len() + state.document_watches.len()
    }

    fn registration(&self, id: u64) -> ListenerRegistration {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        ListenerRegistration::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.state.lock().detach(id);
                trace!(id, "memory listener detached");
            }
        })
    }

    fn check(&self, collection: &str, access: Access, path: String) -> StoreResult<()> {
        if self.inner.state.lock().policy.permits(collection, access) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied { path })
        }
    }

    fn apply(&self, ops: Vec<WriteOp>, enforce: bool) -> StoreResult<()> {
        let _ordered = self.inner.delivery.lock();

        let deliveries = {
            let mut state = self.inner.state.lock();
            let mut staged = state.collections.clone();
            let mut touched = BTreeSet::new();

            for op in &ops {
                let doc = op.doc();
                let collection = doc.collection().name();
                let exists = staged
                    .get(collection)
                    .is_some_and(|docs| docs.contains_key(doc.id()));
                let access = match op {
                    WriteOp::Create { .. } => Access::Create,
                    WriteOp::Set { .. } if !exists => Access::Create,
                    WriteOp::Set { .. } | WriteOp::Update { .. } => Access::Update,
                };
                if enforce && !state.policy.permits(collection, access) {
                    return Err(StoreError::PermissionDenied { path: doc.path() });
                }
                match op {
                    WriteOp::Create { .. } if exists => {
                        return Err(StoreError::AlreadyExists { path: doc.path() });
                    }
                    WriteOp::Update { .. } if !exists => {
                        return Err(StoreError::NotFound { path: doc.path() });
                    }
                    _ => {}
                }
                touched.insert(doc.clone());
            }

            let timestamp = Value::String(
                state
                    .next_timestamp()
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            );
            for op in &ops {
                let doc = op.doc();
                let docs = staged.entry(doc.collection().name().to_string()).or_default();
                let resolved = op.data().resolve(&timestamp);
                match op {
                    WriteOp::Update { .. } => {
                        docs.entry(doc.id().to_string()).or_default().extend(resolved);
                    }
                    WriteOp::Create { .. } | WriteOp::Set { .. } => {
                        docs.insert(doc.id().to_string(), resolved);
                    }
                }
            }

            state.collections = staged;
            debug!(writes = ops.len(), "memory store commit");
            state.deliveries_for(&touched)
        };

        for delivery in deliveries {
            delivery.run();
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn listen_query(&self, query: &Query, listener: QueryListener) -> ListenerRegistration {
        let _ordered = self.inner.delivery.lock();

        let first = {
            let mut state = self.inner.state.lock();
            if state.policy.permits(query.path(), Access::List) {
                let id = state.next_watch_id;
                state.next_watch_id += 1;
                state.query_watches.push(QueryWatch {
                    id,
                    query: query.clone(),
                    listener: Arc::clone(&listener),
                });
                Ok((id, state.evaluate(query)))
            } else {
                Err(StoreError::PermissionDenied {
                    path: query.path().to_string(),
                })
            }
        };

        match first {
            Ok((id, snapshot)) => {
                listener(Ok(snapshot));
                self.registration(id)
            }
            Err(e) => {
                listener(Err(e));
                ListenerRegistration::noop()
            }
        }
    }

    fn listen_document(
        &self,
        doc: &DocumentRef,
        listener: DocumentListener,
    ) -> ListenerRegistration {
        let _ordered = self.inner.delivery.lock();

        let first = {
            let mut state = self.inner.state.lock();
            if state.policy.permits(doc.collection().name(), Access::Get) {
                let id = state.next_watch_id;
                state.next_watch_id += 1;
                state.document_watches.push(DocumentWatch {
                    id,
                    doc: doc.clone(),
                    listener: Arc::clone(&listener),
                });
                Ok((id, state.document(doc)))
            } else {
                Err(StoreError::PermissionDenied { path: doc.path() })
            }
        };

        match first {
            Ok((id, snapshot)) => {
                listener(Ok(snapshot));
                self.registration(id)
            }
            Err(e) => {
                listener(Err(e));
                ListenerRegistration::noop()
            }
        }
    }

    async fn get(&self, doc: &DocumentRef) -> StoreResult<DocumentSnapshot> {
        self.check(doc.collection().name(), Access::Get, doc.path())?;
        Ok(self.inner.state.lock().document(doc))
    }

    async fn run_query(&self, query: &Query) -> StoreResult<QuerySnapshot> {
        self.check(query.path(), Access::List, query.path().to_string())?;
        Ok(self.inner.state.lock().evaluate(query))
    }

    async fn add(&self, collection: &CollectionRef, data: WriteData) -> StoreResult<DocumentRef> {
        let doc = self.new_document_ref(collection);
        // Denials on add report the collection path.
        self.apply(
            vec![WriteOp::Create {
                doc: doc.clone(),
                data,
            }],
            true,
        )
        .map_err(|e| match e {
            StoreError::PermissionDenied { .. } => StoreError::PermissionDenied {
                path: collection.path().to_string(),
            },
            other => other,
        })?;
        Ok(doc)
    }

    async fn set(&self, doc: &DocumentRef, data: WriteData) -> StoreResult<()> {
        self.apply(
            vec![WriteOp::Set {
                doc: doc.clone(),
                data,
            }],
            true,
        )
    }

    async fn update(&self, doc: &DocumentRef, data: WriteData) -> StoreResult<()> {
        self.apply(
            vec![WriteOp::Update {
                doc: doc.clone(),
                data,
            }],
            true,
        )
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        self.apply(batch.into_ops(), true)
    }
}

/// Total order over JSON values: null, booleans, numbers, strings, arrays,
/// objects.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| compare_values(l, r))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("object expected"),
        }
    }

    fn collecting_query() -> (QueryListener, Arc<Mutex<Vec<Result<Vec<String>, String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: QueryListener = Arc::new(move |result: Result<QuerySnapshot, StoreError>| {
            sink.lock().push(
                result
                    .map(|snap| snap.documents().iter().map(|d| d.id().to_string()).collect())
                    .map_err(|e| e.to_string()),
            );
        });
        (listener, seen)
    }

    #[test]
    fn value_ordering() {
        assert_eq!(compare_values(&json!(1), &json!(2.5)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!([1, 2]), &json!([1])), Ordering::Greater);
    }

    #[tokio::test]
    async fn add_stamps_server_time_and_generates_id() {
        let store = MemoryStore::new();
        let tasks = CollectionRef::new("daily_tasks");
        let data = WriteData::new(fields(json!({"roomNumber": "A1"})))
            .with_server_timestamp("createdAt");

        let doc = store.add(&tasks, data).await.unwrap();
        assert_eq!(doc.id().len(), 20);

        let stored = store.fields(&doc).unwrap();
        let created = stored["createdAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[tokio::test]
    async fn server_timestamps_increase() {
        let store = MemoryStore::new();
        let a = DocumentRef::new("inventory", "a");
        let b = DocumentRef::new("inventory", "b");
        store
            .set(&a, WriteData::default().with_server_timestamp("createdAt"))
            .await
            .unwrap();
        store
            .set(&b, WriteData::default().with_server_timestamp("createdAt"))
            .await
            .unwrap();
        let first = store.fields(&a).unwrap()["createdAt"].clone();
        let second = store.fields(&b).unwrap()["createdAt"].clone();
        assert_eq!(compare_values(&first, &second), Ordering::Less);
    }

    #[tokio::test]
    async fn update_merges_and_requires_existing() {
        let store = MemoryStore::new();
        let doc = DocumentRef::new("inventory", "mop");
        let err = store
            .update(&doc, WriteData::new(fields(json!({"quantity": 1}))))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        store.insert(&doc, fields(json!({"name": "Mop", "quantity": 4})));
        store
            .update(&doc, WriteData::new(fields(json!({"quantity": 3}))))
            .await
            .unwrap();
        assert_eq!(
            store.fields(&doc).unwrap(),
            fields(json!({"name": "Mop", "quantity": 3}))
        );
    }

    #[tokio::test]
    async fn denied_writes_change_nothing() {
        let store =
            MemoryStore::with_policy(AccessPolicy::allow_all().deny("inventory", Access::Create));
        let err = store
            .add(&CollectionRef::new("inventory"), WriteData::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied { ref path } if path == "inventory"));
        assert_eq!(store.document_count("inventory"), 0);
    }

    #[tokio::test]
    async fn batch_is_atomic() {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.set(DocumentRef::new("inventory", "a"), WriteData::default());
        batch.update(DocumentRef::new("inventory", "missing"), WriteData::default());

        assert!(store.commit(batch).await.unwrap_err().is_not_found());
        assert_eq!(store.document_count("inventory"), 0);
    }

    #[tokio::test]
    async fn query_filters_and_orders() {
        let store = MemoryStore::new();
        let reports = CollectionRef::new("shift_reports");
        store.insert(&reports.doc("r1"), fields(json!({"residentId": "x", "date": "2024-01-02"})));
        store.insert(&reports.doc("r2"), fields(json!({"residentId": "x", "date": "2024-01-03"})));
        store.insert(&reports.doc("r3"), fields(json!({"residentId": "y", "date": "2024-01-04"})));
        store.insert(&reports.doc("r4"), fields(json!({"residentId": "x"})));

        let query = reports
            .query()
            .where_eq("residentId", "x")
            .order_by("date", Direction::Descending);
        let snap = store.run_query(&query).await.unwrap();
        let ids: Vec<_> = snap.documents().iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["r2", "r1"]);

        let unordered = reports.query().where_eq("residentId", "x");
        assert_eq!(store.run_query(&unordered).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn listener_gets_initial_and_each_commit() {
        let store = MemoryStore::new();
        let inventory = CollectionRef::new("inventory");
        store.insert(&inventory.doc("a"), fields(json!({"n": 1})));

        let (listener, seen) = collecting_query();
        let registration = store.listen_query(&inventory.query(), listener);
        store.insert(&inventory.doc("b"), fields(json!({"n": 2})));
        store.insert(&DocumentRef::new("users", "u"), fields(json!({})));

        assert_eq!(
            *seen.lock(),
            vec![
                Ok(vec!["a".to_string()]),
                Ok(vec!["a".to_string(), "b".to_string()])
            ]
        );

        registration.remove();
        assert_eq!(store.listener_count(), 0);
        store.insert(&inventory.doc("c"), fields(json!({"n": 3})));
        assert_eq!(seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn denied_listen_reports_error_once() {
        let store = MemoryStore::with_policy(AccessPolicy::allow_all().deny_collection("users"));
        let (listener, seen) = collecting_query();
        let registration = store.listen_query(&CollectionRef::new("users").query(), listener);

        assert!(!registration.is_active());
        assert_eq!(
            *seen.lock(),
            vec![Err("permission denied: users".to_string())]
        );
    }

    #[tokio::test]
    async fn revoked_read_ends_listener() {
        let store = MemoryStore::new();
        let tasks = CollectionRef::new("daily_tasks");
        let (listener, seen) = collecting_query();
        let _registration = store.listen_query(&tasks.query(), listener);

        store.set_policy(AccessPolicy::allow_all().deny("daily_tasks", Access::List));
        store.insert(&tasks.doc("t1"), fields(json!({})));
        store.insert(&tasks.doc("t2"), fields(json!({})));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].is_err());
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn document_listener_sees_missing_then_created() {
        let store = MemoryStore::new();
        let doc = DocumentRef::new("users", "u1");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _registration = store.listen_document(
            &doc,
            Arc::new(move |result: Result<DocumentSnapshot, StoreError>| {
                sink.lock().push(result.map(|s| s.exists()).unwrap_or(false));
            }),
        );

        store.insert(&doc, fields(json!({"name": "A"})));
        assert_eq!(*seen.lock(), vec![false, true]);
    }

    #[tokio::test]
    async fn listener_may_write_from_callback() {
        let store = MemoryStore::new();
        let audit = CollectionRef::new("audit");
        let writer = store.clone();
        let _registration = store.listen_query(
            &CollectionRef::new("inventory").query(),
            Arc::new(move |result: Result<QuerySnapshot, StoreError>| {
                if let Ok(snap) = result {
                    writer.insert(
                        &CollectionRef::new("audit").doc(format!("n{}", snap.len())),
                        Fields::new(),
                    );
                }
            }),
        );

        store.insert(&DocumentRef::new("inventory", "a"), Fields::new());
        assert_eq!(store.document_count(audit.name()), 2);
    }
}
