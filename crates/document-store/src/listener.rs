//! Listener callbacks and their registrations.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::snapshot::{DocumentSnapshot, QuerySnapshot};

/// Receives every snapshot of a query, or the error that ended the listen.
pub type QueryListener = Arc<dyn Fn(Result<QuerySnapshot, StoreError>) + Send + Sync>;

/// Receives every snapshot of a document, or the error that ended the listen.
pub type DocumentListener = Arc<dyn Fn(Result<DocumentSnapshot, StoreError>) + Send + Sync>;

/// Handle to an attached listener.
///
/// Detaching runs exactly once: on [`remove`](Self::remove) or on drop,
/// whichever comes first.
pub struct ListenerRegistration {
    detach: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl ListenerRegistration {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Mutex::new(Some(Box::new(detach))),
        }
    }

    /// A registration with nothing to detach.
    pub fn noop() -> Self {
        Self {
            detach: Mutex::new(None),
        }
    }

    pub fn remove(&self) {
        let detach = self.detach.lock().take();
        if let Some(detach) = detach {
            detach();
        }
    }

    pub fn is_active(&self) -> bool {
        self.detach.lock().is_some()
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn detaches_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let registration = ListenerRegistration::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(registration.is_active());
        registration.remove();
        registration.remove();
        drop(registration);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_detaches() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        drop(ListenerRegistration::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!ListenerRegistration::noop().is_active());
    }
}
