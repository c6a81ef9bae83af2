//! Reference tracking shared by both binding kinds.

use std::sync::Arc;

use document_store::ListenerRegistration;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

use crate::state::{LiveState, Observer, Shared, Sink};

struct Slot<K> {
    bound: bool,
    target: Option<Arc<K>>,
    registration: Option<ListenerRegistration>,
}

pub(crate) struct Binding<K, D> {
    shared: Arc<Shared<D>>,
    slot: Mutex<Slot<K>>,
}

impl<K, D: Clone + Default> Binding<K, D> {
    pub(crate) fn new() -> Self {
        Self {
            shared: Shared::new(),
            slot: Mutex::new(Slot {
                bound: false,
                target: None,
                registration: None,
            }),
        }
    }

    pub(crate) fn state(&self) -> LiveState<D> {
        self.shared.state()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<LiveState<D>> {
        self.shared.subscribe()
    }

    pub(crate) fn set_observer(&self, observer: Option<Observer<D>>) {
        self.shared.set_observer(observer);
    }

    pub(crate) fn target(&self) -> Option<Arc<K>> {
        self.slot.lock().target.clone()
    }

    /// Point the binding at `target`.
    ///
    /// `attach` opens the listener; it runs with no lock held, since stores
    /// may deliver the first snapshot before returning.
    pub(crate) fn rebind(
        &self,
        target: Option<Arc<K>>,
        attach: impl FnOnce(&Arc<K>, Sink<D>) -> ListenerRegistration,
    ) {
        let previous = {
            let mut slot = self.slot.lock();
            let same = match (&slot.target, &target) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if slot.bound && same {
                return;
            }
            slot.bound = true;
            slot.target = target.clone();
            slot.registration.take()
        };

        let generation = self.shared.advance();
        if let Some(registration) = previous {
            registration.remove();
            trace!(generation, "previous listener detached");
        }

        let Some(target) = target else {
            self.shared.update(|state| {
                state.data = D::default();
                state.loading = false;
                state.error = None;
            });
            return;
        };

        self.shared.update(|state| state.loading = true);
        let registration = attach(&target, self.shared.sink(generation));

        let mut slot = self.slot.lock();
        if self.shared.generation() == generation {
            slot.registration = Some(registration);
        } else {
            // A newer bind raced past this one.
            drop(slot);
            registration.remove();
        }
    }

    /// Detach without binding anything new. The last state is kept.
    pub(crate) fn unbind(&self) {
        let previous = {
            let mut slot = self.slot.lock();
            slot.bound = false;
            slot.target = None;
            slot.registration.take()
        };
        self.shared.advance();
        if let Some(registration) = previous {
            registration.remove();
        }
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.slot
            .lock()
            .registration
            .as_ref()
            .is_some_and(ListenerRegistration::is_active)
    }
}

impl<K, D> Drop for Binding<K, D> {
    fn drop(&mut self) {
        if let Some(registration) = self.slot.get_mut().registration.take() {
            registration.remove();
        }
    }
}
