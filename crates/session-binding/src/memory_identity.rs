//! Identity provider with accounts registered up front.

use std::collections::HashMap;

use async_trait::async_trait;
use document_store::ListenerRegistration;
use parking_lot::RwLock;
use tracing::info;

use crate::identity::{AuthStateHub, Identity, IdentityCallback, IdentityError, IdentityProvider};

#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, (String, String)>>,
    hub: AuthStateHub,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account. Emails compare case-insensitively.
    pub fn with_account(self, email: &str, password: &str, uid: &str) -> Self {
        self.accounts.write().insert(
            email.trim().to_lowercase(),
            (password.to_string(), uid.to_string()),
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    fn on_auth_state_changed(&self, callback: IdentityCallback) -> ListenerRegistration {
        self.hub.register(callback)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let email = email.trim().to_lowercase();
        let uid = match self.accounts.read().get(&email) {
            Some((expected, uid)) if expected == password => uid.clone(),
            _ => return Err(IdentityError::InvalidCredentials),
        };
        let identity = Identity::new(uid, Some(email));
        info!(uid = %identity.uid, "signed in");
        self.hub.set(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.hub.set(None);
        Ok(())
    }

    fn current(&self) -> Option<Identity> {
        self.hub.current()
    }
}
