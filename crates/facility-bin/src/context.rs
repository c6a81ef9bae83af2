//! Connected state shared by the store-backed commands.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use document_store::{DocumentRef, DocumentStore, ListenerRegistration, RestStore};
use facility_config::Config;
use facility_model::User;
use facility_writes::{FacilityWrites, Writer};
use permission_error_channel::{log_reporter, PermissionErrorChannel};
use serde::de::DeserializeOwned;
use session_binding::{
    sign_in_and_ensure_profile, GateDecision, Identity, IdentityProvider, LoginForm,
    RestIdentityProvider, Route, SessionBinding, SessionState, ViewGate,
};
use tracing::{debug, info};

/// How long a signed-in session may take to load its profile.
const SESSION_TIMEOUT: Duration = Duration::from_secs(15);

pub type CommandResult<T = ()> = Result<T, Box<dyn Error>>;

pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Emulator overrides for the two hosted services.
#[derive(Debug, Default)]
pub struct Endpoints {
    pub store: Option<String>,
    pub auth: Option<String>,
}

/// Arguments every store-backed command connects with.
pub type Connect<'a> = (&'a Config, &'a Endpoints, Option<Credentials>);

pub struct AppContext {
    pub store: Arc<RestStore>,
    pub channel: PermissionErrorChannel,
    session: SessionBinding,
    signed_in: bool,
    _token: ListenerRegistration,
}

impl AppContext {
    /// Build the store and identity clients, then sign in when credentials
    /// were given.
    pub async fn connect((config, endpoints, credentials): Connect<'_>) -> CommandResult<Self> {
        let status = config.store_status();
        let settings = status.settings()?;

        let mut store = RestStore::from_settings(settings)?
            .with_poll_interval(Duration::from_millis(config.poll_interval_ms));
        if let Some(host) = endpoints.store.as_deref() {
            store = store.with_endpoint(host)?;
        }
        let mut identity = RestIdentityProvider::from_settings(settings);
        if let Some(host) = endpoints.auth.as_deref() {
            let host = host.trim_end_matches('/');
            identity = identity
                .with_endpoint(&format!("{host}/identitytoolkit.googleapis.com"))
                .with_token_endpoint(&format!("{host}/securetoken.googleapis.com"));
        }
        let store = Arc::new(store);
        let identity: Arc<dyn IdentityProvider> = Arc::new(identity);

        let channel = PermissionErrorChannel::new();
        channel.subscribe(log_reporter());

        // Registered before the session so reads carry the token.
        let token_store = Arc::clone(&store);
        let token = identity.on_auth_state_changed(Arc::new(move |current: Option<Identity>| {
            token_store.set_id_token(current.and_then(|signed_in| signed_in.id_token));
        }));

        let session = SessionBinding::start(
            Arc::clone(&identity),
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            channel.clone(),
        );

        let signed_in = match credentials {
            Some(credentials) => {
                let form = LoginForm::new(credentials.email, credentials.password);
                let outcome = sign_in_and_ensure_profile(identity.as_ref(), store.as_ref(), &form)
                    .await
                    .map_err(|e| {
                        debug!(error = %e, "sign-in failed");
                        e.user_message()
                    })?;
                info!(
                    uid = %outcome.identity.uid,
                    profile_created = outcome.profile_created,
                    "signed in"
                );
                true
            }
            None => false,
        };

        Ok(Self {
            store,
            channel,
            session,
            signed_in,
            _token: token,
        })
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store) as Arc<dyn DocumentStore>
    }

    pub fn writes(&self) -> FacilityWrites {
        FacilityWrites::new(Writer::new(self.store(), self.channel.clone()))
    }

    /// The session once it has settled, or whatever it holds at the deadline.
    pub async fn session(&self) -> SessionState {
        if !self.signed_in {
            return self.session.state();
        }
        match tokio::time::timeout(SESSION_TIMEOUT, self.session.resolved()).await {
            Ok(state) => state,
            Err(_) => self.session.state(),
        }
    }

    /// The signed-in user, if the session may open `route`.
    pub async fn require(&self, route: Route) -> CommandResult<User> {
        let state = self.session().await;
        match ViewGate::evaluate_route(&state, route) {
            GateDecision::Render(user) => Ok(user.clone()),
            GateDecision::Redirect(Route::Login) => {
                Err("sign in first with --email and --password".into())
            }
            GateDecision::Redirect(_) => {
                Err(format!("{} is not available to your role", route.label()).into())
            }
            GateDecision::Pending => Err("the session did not finish loading".into()),
        }
    }

    /// Read one document, failing when it does not exist.
    pub async fn fetch<T: DeserializeOwned>(&self, doc: &DocumentRef) -> CommandResult<T> {
        let snapshot = self.store.get(doc).await?;
        snapshot
            .decode()?
            .ok_or_else(|| format!("no document at {}", doc.path()).into())
    }
}
