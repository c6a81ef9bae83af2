//! The bus itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::PermissionError;

type Handler = Arc<dyn Fn(&PermissionError) + Send + Sync>;

/// Token returned by [`PermissionErrorChannel::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(SubscriptionId, Handler)>>,
}

/// Publish/subscribe bus for [`PermissionError`]s.
///
/// Cloning yields another handle to the same bus. The binary creates one and
/// hands clones to every binding and writer.
#[derive(Clone, Default)]
pub struct PermissionErrorChannel {
    inner: Arc<Inner>,
}

impl PermissionErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. It sees only events published after this call.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&PermissionError) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .handlers
            .write()
            .expect("lock poisoned")
            .push((id, Arc::new(handler)));
        id
    }

    /// Removes a handler. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.inner.handlers.write().expect("lock poisoned");
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Delivers `error` to every current handler, in registration order,
    /// before returning.
    ///
    /// The handler list is copied first, so handlers may subscribe or
    /// unsubscribe (or publish) without deadlocking. Changes take effect
    /// from the next publish.
    pub fn publish(&self, error: PermissionError) {
        let handlers: Vec<Handler> = self
            .inner
            .handlers
            .read()
            .expect("lock poisoned")
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        tracing::debug!(
            path = %error.path,
            operation = %error.operation,
            handlers = handlers.len(),
            "publishing permission error"
        );

        for handler in handlers {
            handler(&error);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.read().expect("lock poisoned").len()
    }
}

impl std::fmt::Debug for PermissionErrorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionErrorChannel")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
