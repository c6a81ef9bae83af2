//! Email/password login with first-sign-in profile provisioning.

use document_store::{DocumentRef, DocumentStore, StoreError, WriteData};
use facility_model::validation::validate_email;
use facility_model::{UserRole, ValidationError};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::identity::{Identity, IdentityError, IdentityProvider};
use crate::session::USERS_COLLECTION;

const SIGN_IN_FAILED: &str = "Invalid email or password. Please try again.";

/// Profile written for an account that signs in without one.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTemplate {
    pub name: String,
    pub role: UserRole,
    pub avatar_url: String,
}

impl ProfileTemplate {
    /// Fallback for accounts that are not preconfigured.
    pub fn new_user(uid: &str) -> Self {
        Self {
            name: "New User".to_string(),
            role: UserRole::Housekeeper,
            avatar_url: format!("https://i.pravatar.cc/150?u={uid}"),
        }
    }
}

const PRECONFIGURED: [(&str, &str, UserRole); 4] = [
    ("admin@example.com", "Nicholas Kelly", UserRole::Admin),
    ("supervisor@example.com", "Lonnie Kurr", UserRole::Supervisor),
    ("housekeeper@example.com", "Audry Howell", UserRole::Housekeeper),
    ("housekeeper2@example.com", "Hannah Steele", UserRole::Housekeeper),
];

/// Profile for one of the demo accounts, matched case-insensitively.
pub fn preconfigured_profile(email: &str) -> Option<ProfileTemplate> {
    let email = email.trim().to_lowercase();
    PRECONFIGURED
        .iter()
        .find(|(address, _, _)| *address == email)
        .map(|(address, name, role)| ProfileTemplate {
            name: name.to_string(),
            role: *role,
            avatar_url: format!("https://i.pravatar.cc/150?u={address}"),
        })
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(self.email.trim())?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("Password is required."));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("sign-in failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("profile lookup failed: {0}")]
    Store(#[from] StoreError),
}

impl LoginError {
    /// Text for the login form. Everything past validation reads the same.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Identity(_) | Self::Store(_) => SIGN_IN_FAILED.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Identity,
    pub profile_created: bool,
}

/// Sign in, then make sure `users/{uid}` exists.
///
/// A missing profile is written from the preconfigured table, or the
/// "New User" housekeeper fallback, with a server `createdAt`.
pub async fn sign_in_and_ensure_profile(
    provider: &dyn IdentityProvider,
    store: &dyn DocumentStore,
    form: &LoginForm,
) -> Result<LoginOutcome, LoginError> {
    form.validate()?;
    let email = form.email.trim();

    let identity = provider.sign_in(email, &form.password).await?;
    let doc = DocumentRef::new(USERS_COLLECTION, identity.uid.as_str());

    let snapshot = match store.get(&doc).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(path = %doc.path(), error = %e, "profile lookup failed");
            return Err(e.into());
        }
    };
    if snapshot.exists() {
        return Ok(LoginOutcome {
            identity,
            profile_created: false,
        });
    }

    let template =
        preconfigured_profile(email).unwrap_or_else(|| ProfileTemplate::new_user(&identity.uid));
    let mut fields = Map::new();
    fields.insert("name".into(), Value::from(template.name));
    let stored_email = identity
        .email
        .clone()
        .unwrap_or_else(|| email.to_lowercase());
    fields.insert("email".into(), Value::from(stored_email));
    fields.insert("role".into(), Value::from(template.role.as_str()));
    fields.insert("avatarUrl".into(), Value::from(template.avatar_url));
    fields.insert("id".into(), Value::from(identity.uid.as_str()));

    store
        .set(&doc, WriteData::new(fields).with_server_timestamp("createdAt"))
        .await?;
    info!(uid = %identity.uid, role = %template.role, "created profile on first sign-in");

    Ok(LoginOutcome {
        identity,
        profile_created: true,
    })
}
