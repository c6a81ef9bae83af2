//! Write payloads and atomic batches.

use serde::Serialize;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::reference::DocumentRef;
use crate::snapshot::Fields;

/// Fields to write, plus the names of fields the store fills with its own
/// commit time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteData {
    pub fields: Fields,
    pub server_timestamps: Vec<String>,
}

impl WriteData {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    /// Serialize `value`, which must produce a JSON object.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> StoreResult<Self> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self::new(fields)),
            other => Err(StoreError::InvalidArgument(format!(
                "document data must be an object, got {other}"
            ))),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.fields.remove(&field);
        if !self.server_timestamps.contains(&field) {
            self.server_timestamps.push(field);
        }
        self
    }

    /// Every field name this write touches.
    pub fn field_paths(&self) -> Vec<String> {
        self.fields
            .keys()
            .cloned()
            .chain(self.server_timestamps.iter().cloned())
            .collect()
    }

    /// Resolve server timestamps to `timestamp`.
    pub fn resolve(&self, timestamp: &Value) -> Fields {
        let mut fields = self.fields.clone();
        for name in &self.server_timestamps {
            fields.insert(name.clone(), timestamp.clone());
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Write the document only if it does not exist yet.
    Create { doc: DocumentRef, data: WriteData },
    /// Replace the document, creating it if needed.
    Set { doc: DocumentRef, data: WriteData },
    /// Merge fields into an existing document.
    Update { doc: DocumentRef, data: WriteData },
}

impl WriteOp {
    pub fn doc(&self) -> &DocumentRef {
        match self {
            Self::Create { doc, .. } | Self::Set { doc, .. } | Self::Update { doc, .. } => doc,
        }
    }

    pub fn data(&self) -> &WriteData {
        match self {
            Self::Create { data, .. } | Self::Set { data, .. } | Self::Update { data, .. } => data,
        }
    }
}

/// Writes applied all together or not at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, doc: DocumentRef, data: WriteData) -> &mut Self {
        self.ops.push(WriteOp::Create { doc, data });
        self
    }

    pub fn set(&mut self, doc: DocumentRef, data: WriteData) -> &mut Self {
        self.ops.push(WriteOp::Set { doc, data });
        self
    }

    pub fn update(&mut self, doc: DocumentRef, data: WriteData) -> &mut Self {
        self.ops.push(WriteOp::Update { doc, data });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
