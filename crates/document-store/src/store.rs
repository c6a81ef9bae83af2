//! The store trait every backend implements.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::ids::generate_id;
use crate::listener::{DocumentListener, ListenerRegistration, QueryListener};
use crate::reference::{CollectionRef, DocumentRef, Query};
use crate::snapshot::{DocumentSnapshot, QuerySnapshot};
use crate::write::{WriteBatch, WriteData};

/// A hosted-style document database.
///
/// Listeners receive full snapshots, never diffs. After an error a listener
/// receives nothing further; the registration should still be removed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Attach a listener to a query. The current result set is delivered as
    /// soon as it is known.
    fn listen_query(&self, query: &Query, listener: QueryListener) -> ListenerRegistration;

    /// Attach a listener to one document. A missing document is delivered as
    /// a snapshot that does not exist, not as an error.
    fn listen_document(&self, doc: &DocumentRef, listener: DocumentListener)
        -> ListenerRegistration;

    async fn get(&self, doc: &DocumentRef) -> StoreResult<DocumentSnapshot>;

    async fn run_query(&self, query: &Query) -> StoreResult<QuerySnapshot>;

    /// Create a document under a fresh id.
    async fn add(&self, collection: &CollectionRef, data: WriteData) -> StoreResult<DocumentRef>;

    /// Replace (or create) the document at `doc`.
    async fn set(&self, doc: &DocumentRef, data: WriteData) -> StoreResult<()>;

    /// Merge fields into an existing document. Fails with `NotFound` when
    /// the document is absent.
    async fn update(&self, doc: &DocumentRef, data: WriteData) -> StoreResult<()>;

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// A reference with a fresh client-generated id. Nothing is written.
    fn new_document_ref(&self, collection: &CollectionRef) -> DocumentRef {
        collection.doc(generate_id())
    }
}
