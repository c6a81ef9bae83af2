//! A store whose listeners are driven by hand.
//!
//! Tests attach bindings to a `ScriptedStore`, then push snapshots or errors
//! and count attaches and detaches. Writes are recorded and succeed unless
//! writes were denied.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::listener::{DocumentListener, ListenerRegistration, QueryListener};
use crate::reference::{CollectionRef, DocumentRef, Query};
use crate::snapshot::{DocumentSnapshot, Fields, QuerySnapshot};
use crate::store::DocumentStore;
use crate::write::{WriteBatch, WriteData, WriteOp};

#[derive(Default)]
struct Inner {
    next_id: AtomicUsize,
    attaches: AtomicUsize,
    detaches: AtomicUsize,
    queries: Mutex<Vec<(usize, Query, QueryListener)>>,
    documents: Mutex<Vec<(usize, DocumentRef, DocumentListener)>>,
    stored: Mutex<HashMap<DocumentRef, Fields>>,
    writes: Mutex<Vec<WriteOp>>,
    deny_writes: Mutex<bool>,
}

#[derive(Clone, Default)]
pub struct ScriptedStore {
    inner: Arc<Inner>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `snapshot` to every live listener on `query`.
    /// Returns how many listeners received it.
    pub fn push_query(&self, query: &Query, snapshot: QuerySnapshot) -> usize {
        let listeners = self.query_listeners(query);
        for listener in &listeners {
            listener(Ok(snapshot.clone()));
        }
        listeners.len()
    }

    /// Deliver an error to every live listener on `query`.
    pub fn fail_query(&self, query: &Query, error: impl Fn() -> StoreError) -> usize {
        let listeners = self.query_listeners(query);
        for listener in &listeners {
            listener(Err(error()));
        }
        listeners.len()
    }

    pub fn push_document(&self, doc: &DocumentRef, fields: Option<Fields>) -> usize {
        let listeners = self.document_listeners(doc);
        for listener in &listeners {
            listener(Ok(DocumentSnapshot::new(doc.clone(), fields.clone())));
        }
        listeners.len()
    }

    pub fn fail_document(&self, doc: &DocumentRef, error: impl Fn() -> StoreError) -> usize {
        let listeners = self.document_listeners(doc);
        for listener in &listeners {
            listener(Err(error()));
        }
        listeners.len()
    }

    /// Make `get` return `fields` for `doc`.
    pub fn put_document(&self, doc: &DocumentRef, fields: Fields) {
        self.inner.stored.lock().insert(doc.clone(), fields);
    }

    /// Reject every write with `PermissionDenied`.
    pub fn deny_writes(&self, deny: bool) {
        *self.inner.deny_writes.lock() = deny;
    }

    pub fn writes(&self) -> Vec<WriteOp> {
        self.inner.writes.lock().clone()
    }

    pub fn attach_count(&self) -> usize {
        self.inner.attaches.load(Ordering::SeqCst)
    }

    pub fn detach_count(&self) -> usize {
        self.inner.detaches.load(Ordering::SeqCst)
    }

    pub fn active_listeners(&self) -> usize {
        self.inner.queries.lock().len() + self.inner.documents.lock().len()
    }

    fn query_listeners(&self, query: &Query) -> Vec<QueryListener> {
        self.inner
            .queries
            .lock()
            .iter()
            .filter(|(_, q, _)| q == query)
            .map(|(_, _, l)| Arc::clone(l))
            .collect()
    }

    fn document_listeners(&self, doc: &DocumentRef) -> Vec<DocumentListener> {
        self.inner
            .documents
            .lock()
            .iter()
            .filter(|(_, d, _)| d == doc)
            .map(|(_, _, l)| Arc::clone(l))
            .collect()
    }

    fn attach(&self) -> usize {
        self.inner.attaches.fetch_add(1, Ordering::SeqCst);
        self.inner.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn registration(&self, id: usize) -> ListenerRegistration {
        let inner = Arc::clone(&self.inner);
        ListenerRegistration::new(move || {
            inner.queries.lock().retain(|(i, _, _)| *i != id);
            inner.documents.lock().retain(|(i, _, _)| *i != id);
            inner.detaches.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn record(&self, op: WriteOp) -> StoreResult<()> {
        if *self.inner.deny_writes.lock() {
            return Err(StoreError::PermissionDenied {
                path: op.doc().path(),
            });
        }
        self.inner.writes.lock().push(op);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    fn listen_query(&self, query: &Query, listener: QueryListener) -> ListenerRegistration {
        let id = self.attach();
        self.inner.queries.lock().push((id, query.clone(), listener));
        self.registration(id)
    }

    fn listen_document(
        &self,
        doc: &DocumentRef,
        listener: DocumentListener,
    ) -> ListenerRegistration {
        let id = self.attach();
        self.inner.documents.lock().push((id, doc.clone(), listener));
        self.registration(id)
    }

    async fn get(&self, doc: &DocumentRef) -> StoreResult<DocumentSnapshot> {
        let fields = self.inner.stored.lock().get(doc).cloned();
        Ok(DocumentSnapshot::new(doc.clone(), fields))
    }

    async fn run_query(&self, _query: &Query) -> StoreResult<QuerySnapshot> {
        Ok(QuerySnapshot::default())
    }

    async fn add(&self, collection: &CollectionRef, data: WriteData) -> StoreResult<DocumentRef> {
        let doc = self.new_document_ref(collection);
        self.record(WriteOp::Create {
            doc: doc.clone(),
            data,
        })
        .map_err(|_| StoreError::PermissionDenied {
            path: collection.path().to_string(),
        })?;
        Ok(doc)
    }

    async fn set(&self, doc: &DocumentRef, data: WriteData) -> StoreResult<()> {
        self.record(WriteOp::Set {
            doc: doc.clone(),
            data,
        })
    }

    async fn update(&self, doc: &DocumentRef, data: WriteData) -> StoreResult<()> {
        self.record(WriteOp::Update {
            doc: doc.clone(),
            data,
        })
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if *self.inner.deny_writes.lock() {
            let path = batch
                .ops()
                .first()
                .map(|op| op.doc().path())
                .unwrap_or_default();
            return Err(StoreError::PermissionDenied { path });
        }
        self.inner.writes.lock().extend(batch.into_ops());
        Ok(())
    }
}
