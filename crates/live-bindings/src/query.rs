//! Live query binding.

use std::sync::Arc;

use document_store::{DocumentStore, Query, QueryListener, QuerySnapshot, StoreError};
use permission_error_channel::{Operation, PermissionError, PermissionErrorChannel};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::warn;

use crate::binding::Binding;
use crate::state::LiveState;

/// Mirrors the result set of a query as `Vec<T>`.
///
/// Each record is the document's fields with its id merged in as `id`.
pub struct LiveQuery<T> {
    store: Arc<dyn DocumentStore>,
    channel: PermissionErrorChannel,
    binding: Binding<Query, Vec<T>>,
}

impl<T> LiveQuery<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// An unbound query: empty, not loading.
    pub fn new(store: Arc<dyn DocumentStore>, channel: PermissionErrorChannel) -> Self {
        Self {
            store,
            channel,
            binding: Binding::new(),
        }
    }

    /// Call `observer` after every state change.
    pub fn with_observer(
        self,
        observer: impl Fn(&LiveState<Vec<T>>) + Send + Sync + 'static,
    ) -> Self {
        self.binding.set_observer(Some(Arc::new(observer)));
        self
    }

    /// Follow `query`, or nothing for `None`.
    ///
    /// Passing the `Arc` already bound does nothing. Any other value
    /// detaches the current listener first.
    pub fn bind(&self, query: Option<Arc<Query>>) {
        self.binding.rebind(query, |query, sink| {
            let path = query.path().to_string();
            let channel = self.channel.clone();

            let listener: QueryListener =
                Arc::new(move |result: Result<QuerySnapshot, StoreError>| {
                    if !sink.is_current() {
                        return;
                    }
                    match result {
                        Ok(snapshot) => match snapshot.decode_all::<T>() {
                            Ok(records) => {
                                sink.apply(|state| {
                                    state.data = records;
                                    state.loading = false;
                                    state.error = None;
                                });
                            }
                            Err(e) => {
                                warn!(%path, error = %e, "dropping snapshot with undecodable record");
                            }
                        },
                        Err(e) => {
                            warn!(%path, error = %e, "query listener failed");
                            let error = PermissionError::new(path.clone(), Operation::List);
                            channel.publish(error.clone());
                            sink.apply(|state| {
                                state.error = Some(error);
                                state.loading = false;
                            });
                        }
                    }
                });

            self.store.listen_query(query, listener)
        });
    }

    /// Detach, keeping the last state.
    pub fn unbind(&self) {
        self.binding.unbind();
    }

    pub fn state(&self) -> LiveState<Vec<T>> {
        self.binding.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveState<Vec<T>>> {
        self.binding.subscribe()
    }

    pub fn query(&self) -> Option<Arc<Query>> {
        self.binding.target()
    }

    pub fn is_listening(&self) -> bool {
        self.binding.is_listening()
    }
}
