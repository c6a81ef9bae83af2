//! REST client for the hosted document database.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use facility_config::StoreSettings;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, error};
use url::Url;

use super::codec::{self, field_path};
use super::poll::{spawn_poll, MIN_POLL_INTERVAL};
use crate::error::{StoreError, StoreResult};
use crate::listener::{DocumentListener, ListenerRegistration, QueryListener};
use crate::reference::{CollectionRef, Direction, DocumentRef, Query};
use crate::snapshot::{DocumentSnapshot, QuerySnapshot};
use crate::store::DocumentStore;
use crate::write::{WriteBatch, WriteData, WriteOp};

pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// [`DocumentStore`] backed by the hosted database's REST API.
#[derive(Clone)]
pub struct RestStore {
    http_client: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    id_token: Arc<RwLock<Option<String>>>,
    poll_interval: Duration,
}

impl RestStore {
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: project_id.into(),
            api_key: api_key.into(),
            id_token: Arc::new(RwLock::new(None)),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn from_settings(settings: &StoreSettings) -> StoreResult<Self> {
        settings
            .documents_url()
            .map_err(|e| StoreError::InvalidArgument(e.to_string()))?;
        Ok(Self::new(&settings.project_id, &settings.api_key))
    }

    /// Point at another host, such as a local emulator.
    pub fn with_endpoint(mut self, endpoint: &str) -> StoreResult<Self> {
        let url = Url::parse(endpoint).map_err(|e| StoreError::InvalidArgument(e.to_string()))?;
        self.endpoint = url.as_str().trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Gap between polls of live listeners, at least one millisecond.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Identity token sent as a bearer credential so access rules can see
    /// the signed-in user. `None` makes requests unauthenticated.
    pub fn set_id_token(&self, token: Option<String>) {
        *self.id_token.write() = token;
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn documents_url(&self) -> String {
        format!("{}/v1/{}", self.endpoint, self.database_path())
    }

    fn document_name(&self, doc: &DocumentRef) -> String {
        format!("{}/{}", self.database_path(), doc.path())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .http_client
            .request(method, url)
            .query(&[("key", self.api_key.as_str())]);
        match self.id_token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map non-success statuses to store errors for `path`.
    async fn check(response: Response, path: &str) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let path = path.to_string();
        match status {
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                Err(StoreError::PermissionDenied { path })
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound { path }),
            StatusCode::CONFLICT => Err(StoreError::AlreadyExists { path }),
            _ => {
                let message = response.text().await.unwrap_or_default();
                error!(status = status.as_u16(), %path, "store request failed: {message}");
                Err(StoreError::Remote {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn write_json(&self, op: &WriteOp) -> Value {
        let data = op.data();
        let mut write = json!({
            "update": {
                "name": self.document_name(op.doc()),
                "fields": codec::encode_fields(&data.fields),
            }
        });

        match op {
            WriteOp::Create { .. } => {
                write["currentDocument"] = json!({ "exists": false });
            }
            WriteOp::Update { .. } => {
                let mask: Vec<String> = data.fields.keys().map(|k| field_path(k)).collect();
                write["updateMask"] = json!({ "fieldPaths": mask });
                write["currentDocument"] = json!({ "exists": true });
            }
            WriteOp::Set { .. } => {}
        }

        if !data.server_timestamps.is_empty() {
            let transforms: Vec<Value> = data
                .server_timestamps
                .iter()
                .map(|field| json!({ "fieldPath": field_path(field), "setToServerValue": "REQUEST_TIME" }))
                .collect();
            write["updateTransforms"] = Value::Array(transforms);
        }

        write
    }

    fn structured_query(query: &Query) -> Value {
        let mut structured = json!({
            "from": [{ "collectionId": query.collection().name() }],
        });

        let filters: Vec<Value> = query
            .filters()
            .iter()
            .map(|f| {
                json!({
                    "fieldFilter": {
                        "field": { "fieldPath": field_path(&f.field) },
                        "op": "EQUAL",
                        "value": codec::encode_value(&f.value),
                    }
                })
            })
            .collect();
        match filters.len() {
            0 => {}
            1 => structured["where"] = filters[0].clone(),
            _ => {
                structured["where"] = json!({ "compositeFilter": { "op": "AND", "filters": filters } })
            }
        }

        if let Some(order) = query.ordering() {
            let direction = match order.direction {
                Direction::Ascending => "ASCENDING",
                Direction::Descending => "DESCENDING",
            };
            structured["orderBy"] = json!([{
                "field": { "fieldPath": field_path(&order.field) },
                "direction": direction,
            }]);
        }

        json!({ "structuredQuery": structured })
    }

    async fn commit_ops(&self, ops: &[WriteOp], path: &str) -> StoreResult<()> {
        let body = json!({
            "writes": ops.iter().map(|op| self.write_json(op)).collect::<Vec<_>>(),
        });
        let url = format!("{}:commit", self.documents_url());

        debug!(writes = ops.len(), path, "committing writes");
        let response = self.request(Method::POST, &url).json(&body).send().await?;
        Self::check(response, path).await?;
        Ok(())
    }

    async fn fetch_document(&self, doc: &DocumentRef) -> StoreResult<DocumentSnapshot> {
        let url = format!("{}/{}", self.documents_url(), doc.path());
        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DocumentSnapshot::missing(doc.clone()));
        }
        let document: Value = Self::check(response, &doc.path()).await?.json().await?;
        let (_, fields) = codec::decode_document(&document)?;
        Ok(DocumentSnapshot::new(doc.clone(), Some(fields)))
    }

    async fn fetch_query(&self, query: &Query) -> StoreResult<QuerySnapshot> {
        let url = format!("{}:runQuery", self.documents_url());
        let response = self
            .request(Method::POST, &url)
            .json(&Self::structured_query(query))
            .send()
            .await?;
        let rows: Vec<Value> = Self::check(response, query.path()).await?.json().await?;

        let collection = query.collection();
        let documents = rows
            .iter()
            .filter_map(|row| row.get("document"))
            .map(|document| {
                let (id, fields) = codec::decode_document(document)?;
                Ok(DocumentSnapshot::new(collection.doc(id), Some(fields)))
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(QuerySnapshot::new(documents))
    }
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    fn listen_query(&self, query: &Query, listener: QueryListener) -> ListenerRegistration {
        let store = self.clone();
        let query = query.clone();
        spawn_poll(
            self.poll_interval,
            move || {
                let store = store.clone();
                let query = query.clone();
                async move { store.fetch_query(&query).await }
            },
            move |result| listener(result),
        )
    }

    fn listen_document(
        &self,
        doc: &DocumentRef,
        listener: DocumentListener,
    ) -> ListenerRegistration {
        let store = self.clone();
        let doc = doc.clone();
        spawn_poll(
            self.poll_interval,
            move || {
                let store = store.clone();
                let doc = doc.clone();
                async move { store.fetch_document(&doc).await }
            },
            move |result| listener(result),
        )
    }

    async fn get(&self, doc: &DocumentRef) -> StoreResult<DocumentSnapshot> {
        self.fetch_document(doc).await
    }

    async fn run_query(&self, query: &Query) -> StoreResult<QuerySnapshot> {
        self.fetch_query(query).await
    }

    async fn add(&self, collection: &CollectionRef, data: WriteData) -> StoreResult<DocumentRef> {
        let doc = self.new_document_ref(collection);
        let op = WriteOp::Create {
            doc: doc.clone(),
            data,
        };
        self.commit_ops(std::slice::from_ref(&op), collection.path())
            .await?;
        Ok(doc)
    }

    async fn set(&self, doc: &DocumentRef, data: WriteData) -> StoreResult<()> {
        let op = WriteOp::Set {
            doc: doc.clone(),
            data,
        };
        self.commit_ops(std::slice::from_ref(&op), &doc.path()).await
    }

    async fn update(&self, doc: &DocumentRef, data: WriteData) -> StoreResult<()> {
        let op = WriteOp::Update {
            doc: doc.clone(),
            data,
        };
        self.commit_ops(std::slice::from_ref(&op), &doc.path()).await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let path = batch.ops()[0].doc().path();
        self.commit_ops(batch.ops(), &path).await
    }
}
