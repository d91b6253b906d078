//! Email/password sign-in against the identity toolkit REST API.

use async_trait::async_trait;
use clubcal_core::{
    ClubCalError, ClubCalResult, Credentials, IdentityProvider, OwnerId, Session, SessionChannel,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{FirebaseClient, error_reason};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

/// Identity provider backed by the project's email/password accounts.
///
/// Signing in stores the ID token on the shared [`FirebaseClient`], so the
/// document and blob adapters built from the same client act as that user.
#[derive(Clone)]
pub struct FirebaseAuth {
    client: FirebaseClient,
    sessions: SessionChannel,
}

impl FirebaseAuth {
    pub fn new(client: FirebaseClient) -> Self {
        FirebaseAuth {
            client,
            sessions: SessionChannel::new(),
        }
    }

    async fn authenticate(&self, action: &str, credentials: &Credentials) -> ClubCalResult<Session> {
        let url = format!("{}/accounts:{}", self.client.endpoints.identity, action);

        let response = self
            .client
            .http
            .post(&url)
            .query(&[("key", self.client.api_key.as_str())])
            .json(&PasswordRequest {
                email: &credentials.email,
                password: &credentials.password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(ClubCalError::backend)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = error_reason(&body).unwrap_or_else(|| status.to_string());
            return Err(if status.is_client_error() {
                ClubCalError::AuthRejected(reason)
            } else {
                ClubCalError::BackendUnavailable(reason)
            });
        }

        let auth: AuthResponse = response.json().await.map_err(ClubCalError::backend)?;
        let session = session_from(&auth, credentials);

        self.client
            .store_tokens(auth.id_token, auth.refresh_token, auth.expires_in.as_deref())
            .await;
        info!(uid = %session.uid, "signed in");
        self.sessions.publish(Some(session.clone()));

        Ok(session)
    }
}

fn session_from(auth: &AuthResponse, credentials: &Credentials) -> Session {
    Session {
        uid: OwnerId::new(auth.local_id.clone()),
        email: auth
            .email
            .clone()
            .or_else(|| Some(credentials.email.clone())),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn sign_in(&self, credentials: &Credentials) -> ClubCalResult<Session> {
        self.authenticate("signInWithPassword", credentials).await
    }

    async fn sign_up(&self, credentials: &Credentials) -> ClubCalResult<Session> {
        self.authenticate("signUp", credentials).await
    }

    async fn sign_out(&self) -> ClubCalResult<()> {
        self.client.clear_tokens().await;
        self.sessions.publish(None);
        info!("signed out");
        Ok(())
    }

    fn sessions(&self) -> SessionChannel {
        self.sessions.clone()
    }
}
