//! Ready-made handlers.

use std::sync::Mutex;

use crate::error::PermissionError;

/// Logs each event at `error` level with its path, operation and payload.
///
/// This is the top-level diagnostic the binary subscribes at startup.
pub fn log_reporter() -> impl Fn(&PermissionError) + Send + Sync + 'static {
    |err: &PermissionError| {
        tracing::error!(
            path = %err.path,
            operation = %err.operation,
            payload = ?err.request_resource_data,
            "{err}"
        );
    }
}

/// Collects every event it receives. For tests.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<PermissionError>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, error: &PermissionError) {
        self.events.lock().expect("lock poisoned").push(error.clone());
    }

    pub fn events(&self) -> Vec<PermissionError> {
        self.events.lock().expect("lock poisoned").clone()
    }

    pub fn clear(&self) {
        self.events.lock().expect("lock poisoned").clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().expect("lock poisoned").is_empty()
    }
}
