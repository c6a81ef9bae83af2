//! The identity provider seam.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use document_store::ListenerRegistration;
use parking_lot::RwLock;
use thiserror::Error;

/// A signed-in account as reported by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    /// Bearer token for store requests, when the provider issues one.
    pub id_token: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
            id_token: None,
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("has_token", &self.id_token.is_some())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid email or password. Please try again.")]
    InvalidCredentials,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity provider error: {status} - {message}")]
    Remote { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Receives the current identity, `None` when signed out.
pub type IdentityCallback = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

/// Email/password identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register for sign-in state. The callback fires once with the current
    /// state during registration, then on every sign-in and sign-out.
    fn on_auth_state_changed(&self, callback: IdentityCallback) -> ListenerRegistration;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    fn current(&self) -> Option<Identity>;
}

#[derive(Default)]
struct HubInner {
    current: RwLock<Option<Identity>>,
    callbacks: RwLock<Vec<(u64, IdentityCallback)>>,
    next_id: AtomicU64,
}

/// Current identity plus the callbacks watching it. Providers embed one.
#[derive(Clone, Default)]
pub struct AuthStateHub {
    inner: Arc<HubInner>,
}

impl AuthStateHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, callback: IdentityCallback) -> ListenerRegistration {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .callbacks
            .write()
            .push((id, Arc::clone(&callback)));

        callback(self.current());

        let weak: Weak<HubInner> = Arc::downgrade(&self.inner);
        ListenerRegistration::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.callbacks.write().retain(|(existing, _)| *existing != id);
            }
        })
    }

    /// Record `identity` and tell every callback, in registration order.
    pub fn set(&self, identity: Option<Identity>) {
        *self.inner.current.write() = identity.clone();
        let callbacks: Vec<IdentityCallback> = self
            .inner
            .callbacks
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(identity.clone());
        }
    }

    pub fn current(&self) -> Option<Identity> {
        self.inner.current.read().clone()
    }

    pub fn callback_count(&self) -> usize {
        self.inner.callbacks.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn register_fires_immediately_then_on_change() {
        let hub = AuthStateHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let registration = hub.register(Arc::new(move |identity: Option<Identity>| {
            sink.lock().push(identity.map(|i| i.uid));
        }));

        hub.set(Some(Identity::new("u1", None)));
        hub.set(None);
        assert_eq!(*seen.lock(), vec![None, Some("u1".to_string()), None]);

        registration.remove();
        assert_eq!(hub.callback_count(), 0);
        hub.set(Some(Identity::new("u2", None)));
        assert_eq!(seen.lock().len(), 3);
    }

    #[test]
    fn debug_hides_token() {
        let mut identity = Identity::new("u1", Some("a@b.c".into()));
        identity.id_token = Some("secret-token".into());
        let printed = format!("{identity:?}");
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("has_token: true"));
    }
}
