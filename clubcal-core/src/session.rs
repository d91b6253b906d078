//! Signed-in user state.
//!
//! The identity provider publishes every sign-in and sign-out on a
//! [`SessionChannel`]. Anything that needs the current user subscribes to the
//! channel instead of reading shared global state.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::ClubCalResult;
use crate::event::OwnerId;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub uid: OwnerId,
    pub email: Option<String>,
}

impl Session {
    pub fn new(uid: impl Into<String>) -> Self {
        Session {
            uid: OwnerId::new(uid),
            email: None,
        }
    }
}

/// Email/password pair for signing in or up.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticates users. Implementations publish the outcome on their channel.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> ClubCalResult<Session>;

    async fn sign_up(&self, credentials: &Credentials) -> ClubCalResult<Session>;

    async fn sign_out(&self) -> ClubCalResult<()>;

    /// Channel carrying this provider's session changes.
    fn sessions(&self) -> SessionChannel;
}

/// Broadcasts the current session (`None` when signed out).
#[derive(Debug, Clone)]
pub struct SessionChannel {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionChannel {
    /// A channel starting in the signed-out state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        SessionChannel { tx: Arc::new(tx) }
    }

    /// Replace the current session and wake every subscriber.
    pub fn publish(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> SessionWatcher {
        SessionWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving end of a [`SessionChannel`].
pub struct SessionWatcher {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionWatcher {
    pub fn current(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }

    /// Wait for the next published session.
    ///
    /// Returns `None` once every sender is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
