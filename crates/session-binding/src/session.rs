//! The session state machine.

use std::sync::{Arc, Weak};

use document_store::{DocumentRef, DocumentStore, ListenerRegistration};
use facility_model::User;
use live_bindings::LiveDocument;
use parking_lot::Mutex;
use permission_error_channel::PermissionErrorChannel;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::identity::{Identity, IdentityError, IdentityProvider};

pub const USERS_COLLECTION: &str = "users";

/// Where the session stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// The identity provider has not reported yet.
    #[default]
    Unknown,
    Anonymous,
    /// Signed in; the profile document has not arrived.
    LoadingProfile { identity: Identity },
    Authenticated { identity: Identity, user: User },
    /// Signed in, but there is no readable profile for the uid.
    ProfileMissing { identity: Identity },
}

impl SessionState {
    pub fn loading(&self) -> bool {
        matches!(self, Self::Unknown | Self::LoadingProfile { .. })
    }

    /// Only a loaded profile authenticates.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::LoadingProfile { identity }
            | Self::Authenticated { identity, .. }
            | Self::ProfileMissing { identity } => Some(identity),
            Self::Unknown | Self::Anonymous => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Anonymous => "anonymous",
            Self::LoadingProfile { .. } => "loading-profile",
            Self::Authenticated { .. } => "authenticated",
            Self::ProfileMissing { .. } => "profile-missing",
        }
    }
}

struct SessionInner {
    /// `None` until the provider reports; then the signed-in identity, if any.
    identity: Mutex<Option<Option<Identity>>>,
    profile: LiveDocument<User>,
    state: watch::Sender<SessionState>,
}

impl SessionInner {
    fn on_identity(&self, identity: Option<Identity>) {
        let uid = identity.as_ref().map(|i| i.uid.clone());
        *self.identity.lock() = Some(identity);

        let bound = self.profile.document().map(|doc| doc.id().to_string());
        match uid {
            Some(uid) if bound.as_deref() == Some(uid.as_str()) => {
                // Same account, new token: keep the existing listener.
            }
            Some(uid) => {
                debug!(%uid, "binding profile");
                self.profile
                    .bind(Some(Arc::new(DocumentRef::new(USERS_COLLECTION, uid))));
            }
            None => self.profile.bind(None),
        }
        self.recompute();
    }

    fn derive(&self) -> SessionState {
        let identity = self.identity.lock().clone();
        let identity = match identity {
            None => return SessionState::Unknown,
            Some(None) => return SessionState::Anonymous,
            Some(Some(identity)) => identity,
        };

        let on_uid = self
            .profile
            .document()
            .is_some_and(|doc| doc.id() == identity.uid);
        let profile = self.profile.state();
        if !on_uid || profile.loading {
            return SessionState::LoadingProfile { identity };
        }
        match profile.data {
            Some(user) => SessionState::Authenticated { identity, user },
            None => SessionState::ProfileMissing { identity },
        }
    }

    fn recompute(&self) {
        let changed = self.state.send_if_modified(|current| {
            let next = self.derive();
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            info!(state = self.state.borrow().label(), "session changed");
        }
    }
}

/// Live session: identity stream plus the signed-in user's profile.
///
/// Dropping the binding detaches both listeners.
pub struct SessionBinding {
    inner: Arc<SessionInner>,
    provider: Arc<dyn IdentityProvider>,
    _auth: ListenerRegistration,
}

impl SessionBinding {
    pub fn start(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        channel: PermissionErrorChannel,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        let inner = Arc::new_cyclic(|weak: &Weak<SessionInner>| {
            let weak = weak.clone();
            SessionInner {
                identity: Mutex::new(None),
                profile: LiveDocument::new(store, channel).with_observer(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        inner.recompute();
                    }
                }),
                state,
            }
        });

        let weak = Arc::downgrade(&inner);
        let auth = provider.on_auth_state_changed(Arc::new(move |identity| {
            if let Some(inner) = weak.upgrade() {
                inner.on_identity(identity);
            }
        }));

        Self {
            inner,
            provider,
            _auth: auth,
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    /// Wait until the session leaves its loading states.
    pub async fn resolved(&self) -> SessionState {
        let mut receiver = self.subscribe();
        let result = receiver.wait_for(|state| !state.loading()).await;
        match result {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        self.provider.sign_out().await
    }
}

impl std::fmt::Debug for SessionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBinding")
            .field("state", &self.state().label())
            .finish_non_exhaustive()
    }
}
