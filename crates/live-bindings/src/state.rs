//! Observable binding state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use permission_error_channel::PermissionError;
use tokio::sync::watch;

/// What a binding currently knows.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveState<D> {
    pub data: D,
    pub loading: bool,
    pub error: Option<PermissionError>,
}

impl<D: Default> Default for LiveState<D> {
    fn default() -> Self {
        Self {
            data: D::default(),
            loading: false,
            error: None,
        }
    }
}

/// Called with the new state after every change.
pub type Observer<D> = Arc<dyn Fn(&LiveState<D>) + Send + Sync>;

pub(crate) struct Shared<D> {
    state: watch::Sender<LiveState<D>>,
    generation: AtomicU64,
    observer: RwLock<Option<Observer<D>>>,
}

impl<D: Clone + Default> Shared<D> {
    pub(crate) fn new() -> Arc<Self> {
        let (state, _) = watch::channel(LiveState::default());
        Arc::new(Self {
            state,
            generation: AtomicU64::new(0),
            observer: RwLock::new(None),
        })
    }

    pub(crate) fn state(&self) -> LiveState<D> {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<LiveState<D>> {
        self.state.subscribe()
    }

    pub(crate) fn set_observer(&self, observer: Option<Observer<D>>) {
        *self.observer.write() = observer;
    }

    /// Start a new generation; sinks from older ones go quiet.
    pub(crate) fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Apply `change`, then notify the observer outside every lock.
    pub(crate) fn update(&self, change: impl FnOnce(&mut LiveState<D>)) {
        self.state.send_modify(change);
        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            let snapshot = self.state();
            observer(&snapshot);
        }
    }

    pub(crate) fn sink(self: &Arc<Self>, generation: u64) -> Sink<D> {
        Sink {
            shared: Arc::downgrade(self),
            generation,
        }
    }
}

/// Write access for one listener generation.
pub(crate) struct Sink<D> {
    shared: Weak<Shared<D>>,
    generation: u64,
}

impl<D: Clone + Default> Sink<D> {
    /// Apply `change` unless the binding is gone or has moved on.
    /// Returns whether it was applied.
    pub(crate) fn apply(&self, change: impl FnOnce(&mut LiveState<D>)) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        if shared.generation() != self.generation {
            return false;
        }
        shared.update(change);
        true
    }

    pub(crate) fn is_current(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.generation() == self.generation)
    }
}
