//! The write wrapper.

use std::sync::Arc;

use document_store::{CollectionRef, DocumentRef, DocumentStore, StoreError, WriteData};
use permission_error_channel::{Operation, PermissionError, PermissionErrorChannel};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::WriteError;

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

/// Applies writes to the store and reports rejections on the channel.
#[derive(Clone)]
pub struct Writer {
    store: Arc<dyn DocumentStore>,
    channel: PermissionErrorChannel,
}

impl Writer {
    pub fn new(store: Arc<dyn DocumentStore>, channel: PermissionErrorChannel) -> Self {
        Self { store, channel }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn channel(&self) -> &PermissionErrorChannel {
        &self.channel
    }

    /// Add a document with a store-generated id, stamping `createdAt` and
    /// `updatedAt`. A rejection is reported against the collection path.
    pub async fn create<P>(
        &self,
        collection: &CollectionRef,
        payload: &P,
    ) -> Result<DocumentRef, WriteError>
    where
        P: Serialize + ?Sized,
    {
        let (data, attempted) = encode(payload)?;
        let data = data
            .with_server_timestamp(CREATED_AT)
            .with_server_timestamp(UPDATED_AT);

        match self.store.add(collection, data).await {
            Ok(doc) => {
                debug!(path = %doc.path(), "document created");
                Ok(doc)
            }
            Err(e) => Err(self.reject(collection.path(), Operation::Create, attempted, e)),
        }
    }

    /// Write a whole document under a client-chosen id, stamping
    /// `createdAt`.
    pub async fn set<P>(&self, doc: &DocumentRef, payload: &P) -> Result<(), WriteError>
    where
        P: Serialize + ?Sized,
    {
        let (data, attempted) = encode(payload)?;
        self.apply_set(doc, data, attempted).await
    }

    /// [`set`](Self::set), but a rejection reports `reported` instead of
    /// the stored fields.
    pub async fn set_reporting<P, R>(
        &self,
        doc: &DocumentRef,
        payload: &P,
        reported: &R,
    ) -> Result<(), WriteError>
    where
        P: Serialize + ?Sized,
        R: Serialize + ?Sized,
    {
        let (data, _) = encode(payload)?;
        let attempted =
            serde_json::to_value(reported).map_err(|e| WriteError::Encode(e.into()))?;
        self.apply_set(doc, data, attempted).await
    }

    async fn apply_set(
        &self,
        doc: &DocumentRef,
        data: WriteData,
        attempted: Value,
    ) -> Result<(), WriteError> {
        let data = data.with_server_timestamp(CREATED_AT);

        match self.store.set(doc, data).await {
            Ok(()) => {
                debug!(path = %doc.path(), "document set");
                Ok(())
            }
            Err(e) => Err(self.reject(&doc.path(), Operation::Create, attempted, e)),
        }
    }

    /// Merge `partial` into an existing document, stamping `updatedAt`.
    pub async fn update<P>(&self, doc: &DocumentRef, partial: &P) -> Result<(), WriteError>
    where
        P: Serialize + ?Sized,
    {
        let (data, attempted) = encode(partial)?;
        let data = data.with_server_timestamp(UPDATED_AT);

        match self.store.update(doc, data).await {
            Ok(()) => {
                debug!(path = %doc.path(), "document updated");
                Ok(())
            }
            Err(e) => Err(self.reject(&doc.path(), Operation::Update, attempted, e)),
        }
    }

    /// Issue [`create`](Self::create) without waiting. Failures still reach
    /// the channel; the handle is for callers that care.
    pub fn spawn_create<P>(
        &self,
        collection: CollectionRef,
        payload: P,
    ) -> JoinHandle<Result<DocumentRef, WriteError>>
    where
        P: Serialize + Send + Sync + 'static,
    {
        let writer = self.clone();
        tokio::spawn(async move { writer.create(&collection, &payload).await })
    }

    pub fn spawn_update<P>(&self, doc: DocumentRef, partial: P) -> JoinHandle<Result<(), WriteError>>
    where
        P: Serialize + Send + Sync + 'static,
    {
        let writer = self.clone();
        tokio::spawn(async move { writer.update(&doc, &partial).await })
    }

    fn reject(
        &self,
        path: &str,
        operation: Operation,
        attempted: Value,
        source: StoreError,
    ) -> WriteError {
        warn!(path, %operation, error = %source, "write rejected");
        let error = PermissionError::new(path, operation).with_payload(attempted);
        self.channel.publish(error.clone());
        WriteError::Rejected { error, source }
    }
}

impl std::fmt::Debug for Writer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

/// Write data plus the payload as submitted, for the error report.
fn encode<P: Serialize + ?Sized>(payload: &P) -> Result<(WriteData, Value), WriteError> {
    let data = WriteData::from_serializable(payload).map_err(WriteError::Encode)?;
    let attempted = Value::Object(data.fields.clone());
    Ok((data, attempted))
}
