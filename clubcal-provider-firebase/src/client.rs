//! Shared HTTP client, endpoints and the signed-in user's tokens.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use clubcal_core::{BackendConfig, ClubCalError, ClubCalResult};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Refresh this long before the ID token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;
/// Used when the backend omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Base URLs of the REST APIs.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub identity: String,
    pub secure_token: String,
    pub firestore: String,
    pub storage: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            identity: "https://identitytoolkit.googleapis.com/v1".to_string(),
            secure_token: "https://securetoken.googleapis.com/v1".to_string(),
            firestore: "https://firestore.googleapis.com/v1".to_string(),
            storage: "https://firebasestorage.googleapis.com/v0".to_string(),
        }
    }
}

impl Endpoints {
    /// Local emulator suite, e.g. `emulator("localhost:9099", "localhost:8080", "localhost:9199")`.
    pub fn emulator(auth_host: &str, firestore_host: &str, storage_host: &str) -> Self {
        Endpoints {
            identity: format!("http://{}/identitytoolkit.googleapis.com/v1", auth_host),
            secure_token: format!("http://{}/securetoken.googleapis.com/v1", auth_host),
            firestore: format!("http://{}/v1", firestore_host),
            storage: format!("http://{}/v0", storage_host),
        }
    }
}

#[derive(Debug, Clone)]
struct Tokens {
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Tokens {
    fn new(id_token: String, refresh_token: String, expires_in: Option<&str>) -> Self {
        let lifetime = expires_in
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Tokens {
            id_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        }
    }

    fn needs_refresh(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }
}

/// Response of the secure token endpoint (snake_case, unlike the rest).
#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: Option<String>,
}

/// Connection to one backend project, shared by the auth, document and blob adapters.
#[derive(Clone)]
pub struct FirebaseClient {
    pub(crate) http: reqwest::Client,
    pub(crate) endpoints: Arc<Endpoints>,
    pub(crate) project_id: String,
    pub(crate) api_key: String,
    pub(crate) bucket: String,
    tokens: Arc<RwLock<Option<Tokens>>>,
}

impl FirebaseClient {
    pub fn new(config: &BackendConfig) -> ClubCalResult<Self> {
        config.validate()?;

        Ok(FirebaseClient {
            http: reqwest::Client::new(),
            endpoints: Arc::new(Endpoints::default()),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            bucket: config.bucket(),
            tokens: Arc::new(RwLock::new(None)),
        })
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = Arc::new(endpoints);
        self
    }

    pub(crate) async fn store_tokens(
        &self,
        id_token: String,
        refresh_token: String,
        expires_in: Option<&str>,
    ) {
        *self.tokens.write().await = Some(Tokens::new(id_token, refresh_token, expires_in));
    }

    pub(crate) async fn clear_tokens(&self) {
        *self.tokens.write().await = None;
    }

    /// The signed-in user's ID token, refreshed when close to expiry.
    pub(crate) async fn bearer(&self) -> ClubCalResult<String> {
        let current = self
            .tokens
            .read()
            .await
            .clone()
            .ok_or(ClubCalError::AuthRequired)?;

        if !current.needs_refresh() {
            return Ok(current.id_token);
        }

        debug!("ID token expired, refreshing");
        let refreshed = self.refresh(&current.refresh_token).await?;
        let id_token = refreshed.id_token.clone();
        *self.tokens.write().await = Some(refreshed);
        Ok(id_token)
    }

    async fn refresh(&self, refresh_token: &str) -> ClubCalResult<Tokens> {
        let url = format!("{}/token", self.endpoints.secure_token);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(ClubCalError::backend)?;

        let response = expect_success(response).await?;
        let body: RefreshResponse = response.json().await.map_err(ClubCalError::backend)?;

        Ok(Tokens::new(
            body.id_token,
            body.refresh_token,
            body.expires_in.as_deref(),
        ))
    }

    /// `.../projects/<id>/databases/(default)/documents`
    pub(crate) fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.endpoints.firestore, self.project_id
        )
    }

    /// `.../b/<bucket>/o`
    pub(crate) fn objects_url(&self) -> ClubCalResult<Url> {
        storage_url(&self.endpoints.storage, &["b", self.bucket.as_str(), "o"])
    }

    /// `.../b/<bucket>/o/<path>` with the object path as one encoded segment.
    pub(crate) fn object_url(&self, path: &str) -> ClubCalResult<Url> {
        storage_url(&self.endpoints.storage, &["b", self.bucket.as_str(), "o", path])
    }
}

/// Append `segments` to `base`, percent-encoding each (slashes included).
fn storage_url(base: &str, segments: &[&str]) -> ClubCalResult<Url> {
    let mut url = Url::parse(base).map_err(|e| ClubCalError::Config(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ClubCalError::Config(format!("'{}' cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// The reason code of an error body, e.g. `EMAIL_NOT_FOUND` out of
/// `{"error": {"message": "EMAIL_NOT_FOUND"}}`.
pub(crate) fn error_reason(body: &str) -> Option<String> {
    let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
    let reason = parsed
        .error
        .message
        .split(" : ")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    if reason.is_empty() { None } else { Some(reason) }
}

/// Pass successful responses through; turn anything else into `BackendUnavailable`.
pub(crate) async fn expect_success(response: reqwest::Response) -> ClubCalResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reason = error_reason(&body).unwrap_or(body);
    Err(ClubCalError::BackendUnavailable(format!("{}: {}", status, reason)))
}
