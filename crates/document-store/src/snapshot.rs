//! Point-in-time views of documents and query results.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::StoreResult;
use crate::reference::DocumentRef;

/// Field set of a stored document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    reference: DocumentRef,
    fields: Option<Fields>,
}

impl DocumentSnapshot {
    pub fn new(reference: DocumentRef, fields: Option<Fields>) -> Self {
        Self { reference, fields }
    }

    pub fn missing(reference: DocumentRef) -> Self {
        Self::new(reference, None)
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    pub fn path(&self) -> String {
        self.reference.path()
    }

    pub fn reference(&self) -> &DocumentRef {
        &self.reference
    }

    pub fn exists(&self) -> bool {
        self.fields.is_some()
    }

    pub fn fields(&self) -> Option<&Fields> {
        self.fields.as_ref()
    }

    /// The stored fields with the document id merged in as `id`. A stored
    /// `id` field wins over the document id.
    pub fn record(&self) -> Option<Value> {
        let mut record = self.fields.clone()?;
        record
            .entry("id")
            .or_insert_with(|| Value::String(self.reference.id().to_string()));
        Some(Value::Object(record))
    }

    /// Decode [`record`](Self::record) into `T`. `Ok(None)` for a missing
    /// document.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<Option<T>> {
        match self.record() {
            Some(record) => Ok(Some(serde_json::from_value(record)?)),
            None => Ok(None),
        }
    }
}

/// The full result set of a query at one instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuerySnapshot {
    documents: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub fn new(documents: Vec<DocumentSnapshot>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[DocumentSnapshot] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Decode every document. Fails as a whole if any record does not fit.
    pub fn decode_all<T: DeserializeOwned>(&self) -> StoreResult<Vec<T>> {
        self.documents
            .iter()
            .filter_map(DocumentSnapshot::record)
            .map(|record| serde_json::from_value(record).map_err(Into::into))
            .collect()
    }
}
