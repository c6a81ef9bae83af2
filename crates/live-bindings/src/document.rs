//! Live document binding.

use std::sync::Arc;

use document_store::{DocumentListener, DocumentRef, DocumentSnapshot, DocumentStore, StoreError};
use permission_error_channel::{Operation, PermissionError, PermissionErrorChannel};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::warn;

use crate::binding::Binding;
use crate::state::LiveState;

/// Mirrors one document as `Option<T>`. A missing document is `None`
/// without an error.
pub struct LiveDocument<T> {
    store: Arc<dyn DocumentStore>,
    channel: PermissionErrorChannel,
    binding: Binding<DocumentRef, Option<T>>,
}

impl<T> LiveDocument<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<dyn DocumentStore>, channel: PermissionErrorChannel) -> Self {
        Self {
            store,
            channel,
            binding: Binding::new(),
        }
    }

    pub fn with_observer(
        self,
        observer: impl Fn(&LiveState<Option<T>>) + Send + Sync + 'static,
    ) -> Self {
        self.binding.set_observer(Some(Arc::new(observer)));
        self
    }

    pub fn bind(&self, doc: Option<Arc<DocumentRef>>) {
        self.binding.rebind(doc, |doc, sink| {
            let path = doc.path();
            let channel = self.channel.clone();

            let listener: DocumentListener =
                Arc::new(move |result: Result<DocumentSnapshot, StoreError>| {
                    if !sink.is_current() {
                        return;
                    }
                    match result {
                        Ok(snapshot) => match snapshot.decode::<T>() {
                            Ok(record) => {
                                sink.apply(|state| {
                                    state.data = record;
                                    state.loading = false;
                                    state.error = None;
                                });
                            }
                            Err(e) => {
                                warn!(%path, error = %e, "dropping undecodable document");
                            }
                        },
                        Err(e) => {
                            warn!(%path, error = %e, "document listener failed");
                            let error = PermissionError::new(path.clone(), Operation::Get);
                            channel.publish(error.clone());
                            sink.apply(|state| {
                                state.error = Some(error);
                                state.loading = false;
                            });
                        }
                    }
                });

            self.store.listen_document(doc, listener)
        });
    }

    pub fn unbind(&self) {
        self.binding.unbind();
    }

    pub fn state(&self) -> LiveState<Option<T>> {
        self.binding.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveState<Option<T>>> {
        self.binding.subscribe()
    }

    pub fn document(&self) -> Option<Arc<DocumentRef>> {
        self.binding.target()
    }

    pub fn is_listening(&self) -> bool {
        self.binding.is_listening()
    }
}
