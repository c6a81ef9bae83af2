//! Identity provider backed by the hosted email/password sign-in API.

use std::time::Duration;

use async_trait::async_trait;
use document_store::ListenerRegistration;
use facility_config::StoreSettings;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::identity::{AuthStateHub, Identity, IdentityCallback, IdentityError, IdentityProvider};

pub const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://securetoken.googleapis.com";

/// Lifetime assumed when a response omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
/// How long before expiry the token is exchanged.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);
const MIN_REFRESH_DELAY: Duration = Duration::from_secs(30);

/// Error codes the sign-in endpoint returns for bad credentials.
const CREDENTIAL_ERRORS: [&str; 5] = [
    "INVALID_LOGIN_CREDENTIALS",
    "INVALID_PASSWORD",
    "EMAIL_NOT_FOUND",
    "INVALID_EMAIL",
    "USER_DISABLED",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<String>,
}

/// Body of the token exchange, which uses snake_case keys.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

/// When to exchange a token that lives for `expires_in` seconds.
fn refresh_delay(expires_in: Option<&str>) -> Duration {
    let lifetime = expires_in
        .and_then(|secs| secs.trim().parse::<u64>().ok())
        .map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
    lifetime
        .saturating_sub(REFRESH_MARGIN)
        .max(MIN_REFRESH_DELAY)
}

/// Keeps the signed-in identity's token fresh until sign-out.
#[derive(Clone)]
struct TokenRefresher {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
    hub: AuthStateHub,
}

impl TokenRefresher {
    async fn exchange(&self, refresh_token: &str) -> Result<RefreshResponse, IdentityError> {
        let response = self
            .http_client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestIdentityProvider::classify(status, &body));
        }
        Ok(response.json().await?)
    }

    /// Sleep until shortly before expiry, swap in a new token, repeat.
    /// A failed exchange leaves the current token to expire.
    async fn run(self, mut identity: Identity, mut refresh_token: String, mut delay: Duration) {
        loop {
            tokio::time::sleep(delay).await;
            match self.exchange(&refresh_token).await {
                Ok(body) => {
                    identity.id_token = Some(body.id_token);
                    refresh_token = body.refresh_token;
                    delay = refresh_delay(body.expires_in.as_deref());
                    debug!(uid = %identity.uid, next_in = ?delay, "id token refreshed");
                    self.hub.set(Some(identity.clone()));
                }
                Err(e) => {
                    warn!(uid = %identity.uid, error = %e, "token refresh failed");
                    break;
                }
            }
        }
    }
}

pub struct RestIdentityProvider {
    http_client: reqwest::Client,
    endpoint: String,
    token_endpoint: String,
    api_key: String,
    hub: AuthStateHub,
    refresher: Mutex<Option<JoinHandle<()>>>,
}

impl RestIdentityProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            endpoint: DEFAULT_IDENTITY_ENDPOINT.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            api_key: api_key.into(),
            hub: AuthStateHub::new(),
            refresher: Mutex::new(None),
        }
    }

    pub fn from_settings(settings: &StoreSettings) -> Self {
        Self::new(&settings.api_key)
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Host of the token exchange, which emulators serve separately.
    pub fn with_token_endpoint(mut self, endpoint: &str) -> Self {
        self.token_endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    fn sign_in_url(&self) -> String {
        format!("{}/v1/accounts:signInWithPassword", self.endpoint)
    }

    fn token_url(&self) -> String {
        format!("{}/v1/token", self.token_endpoint)
    }

    /// Replace any running refresh task with one for `identity`.
    fn schedule_refresh(
        &self,
        identity: &Identity,
        refresh_token: String,
        expires_in: Option<&str>,
    ) {
        let refresher = TokenRefresher {
            http_client: self.http_client.clone(),
            url: self.token_url(),
            api_key: self.api_key.clone(),
            hub: self.hub.clone(),
        };
        let delay = refresh_delay(expires_in);
        debug!(uid = %identity.uid, refresh_in = ?delay, "token refresh scheduled");
        let task = tokio::spawn(refresher.run(identity.clone(), refresh_token, delay));
        if let Some(previous) = self.refresher.lock().replace(task) {
            previous.abort();
        }
    }

    fn cancel_refresh(&self) {
        if let Some(task) = self.refresher.lock().take() {
            task.abort();
        }
    }

    /// Turn an error body into an [`IdentityError`].
    fn classify(status: StatusCode, body: &str) -> IdentityError {
        let code = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or_default();
        // Codes may carry a suffix, e.g. "INVALID_PASSWORD : details".
        let head = code.split([' ', ':']).next().unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && CREDENTIAL_ERRORS.contains(&head) {
            return IdentityError::InvalidCredentials;
        }
        IdentityError::Remote {
            status: status.as_u16(),
            message: if code.is_empty() { body.to_string() } else { code },
        }
    }
}

impl Drop for RestIdentityProvider {
    fn drop(&mut self) {
        self.cancel_refresh();
    }
}

impl std::fmt::Debug for RestIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestIdentityProvider")
            .field("endpoint", &self.endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    fn on_auth_state_changed(&self, callback: IdentityCallback) -> ListenerRegistration {
        self.hub.register(callback)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        debug!(email, "signing in");
        let response = self
            .http_client
            .post(self.sign_in_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = Self::classify(status, &body);
            warn!(status = status.as_u16(), error = %error, "sign-in rejected");
            return Err(error);
        }

        let body: SignInResponse = response.json().await?;
        let identity = Identity {
            uid: body.local_id,
            email: body.email.or_else(|| Some(email.to_string())),
            id_token: Some(body.id_token),
        };
        info!(uid = %identity.uid, "signed in");
        match body.refresh_token {
            Some(refresh_token) => {
                self.schedule_refresh(&identity, refresh_token, body.expires_in.as_deref())
            }
            None => self.cancel_refresh(),
        }
        self.hub.set(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.cancel_refresh();
        self.hub.set(None);
        Ok(())
    }

    fn current(&self) -> Option<Identity> {
        self.hub.current()
    }
}
