//! In-process backend.
//!
//! Implements every port over shared in-memory state. Used by tests and by
//! embedders that want to run the planner without a network backend. Faults
//! can be switched on to exercise the failure paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClubCalError, ClubCalResult};
use crate::event::{Event, EventFields, EventId, EventRecord, OwnerId};
use crate::file::{BlobPath, FileAssociation, FileId, FileRecord};
use crate::session::{Credentials, IdentityProvider, Session, SessionChannel};
use crate::store::{BlobStorage, EventStore, FileAssociationStore};

const URL_SCHEME: &str = "memory://";

#[derive(Default)]
struct MemoryState {
    // Insertion order is the store order seen by lookups.
    events: Vec<(EventId, EventRecord)>,
    files: Vec<(FileId, FileRecord)>,
    blobs: HashMap<String, Vec<u8>>,
}

#[derive(Default)]
struct Faults {
    offline: AtomicBool,
    download_urls_unavailable: AtomicBool,
}

/// Event store, file association store and blob storage in one.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
    faults: Arc<Faults>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `BackendUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.faults.offline.store(offline, Ordering::SeqCst);
    }

    /// Make `download_url` fail while writes still succeed.
    pub fn fail_download_urls(&self, fail: bool) {
        self.faults
            .download_urls_unavailable
            .store(fail, Ordering::SeqCst);
    }

    /// Resolve a URL handed out by `download_url` to the blob's current bytes.
    pub async fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        let path = url.strip_prefix(URL_SCHEME)?;
        self.state.read().await.blobs.get(path).cloned()
    }

    pub async fn blob_count(&self) -> usize {
        self.state.read().await.blobs.len()
    }

    fn check(&self) -> ClubCalResult<()> {
        if self.faults.offline.load(Ordering::SeqCst) {
            return Err(ClubCalError::BackendUnavailable(
                "memory backend is offline".into(),
            ));
        }
        Ok(())
    }
}

fn next_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl EventStore for MemoryBackend {
    async fn list_events(&self, owner: &OwnerId) -> ClubCalResult<Vec<Event>> {
        self.check()?;
        let state = self.state.read().await;

        Ok(state
            .events
            .iter()
            .filter(|(_, record)| &record.uid == owner)
            .map(|(id, record)| Event::from_record(id.clone(), record.clone()))
            .collect())
    }

    async fn create_event(&self, owner: &OwnerId, fields: &EventFields) -> ClubCalResult<Event> {
        self.check()?;
        let id = EventId::new(next_id());
        let record = EventRecord {
            uid: owner.clone(),
            fields: fields.clone(),
        };

        self.state
            .write()
            .await
            .events
            .push((id.clone(), record.clone()));
        debug!(event_id = %id, "memory: created event");

        Ok(Event::from_record(id, record))
    }

    async fn update_event(
        &self,
        id: &EventId,
        owner: &OwnerId,
        fields: &EventFields,
    ) -> ClubCalResult<Event> {
        self.check()?;
        let mut state = self.state.write().await;

        let slot = state
            .events
            .iter_mut()
            .find(|(existing, _)| existing == id)
            .ok_or_else(|| ClubCalError::EventNotFound(id.clone()))?;

        slot.1 = EventRecord {
            uid: owner.clone(),
            fields: fields.clone(),
        };

        Ok(Event::from_record(id.clone(), slot.1.clone()))
    }

    async fn delete_event(&self, id: &EventId) -> ClubCalResult<()> {
        self.check()?;
        self.state
            .write()
            .await
            .events
            .retain(|(existing, _)| existing != id);
        Ok(())
    }
}

#[async_trait]
impl FileAssociationStore for MemoryBackend {
    async fn find_file_for_event(
        &self,
        event_id: &EventId,
    ) -> ClubCalResult<Option<FileAssociation>> {
        Ok(self.files_for_event(event_id).await?.into_iter().next())
    }

    async fn files_for_event(&self, event_id: &EventId) -> ClubCalResult<Vec<FileAssociation>> {
        self.check()?;
        let state = self.state.read().await;

        Ok(state
            .files
            .iter()
            .filter(|(_, record)| &record.event_id == event_id)
            .map(|(id, record)| FileAssociation::from_record(id.clone(), record.clone()))
            .collect())
    }

    async fn record_file(
        &self,
        event_id: &EventId,
        url: &str,
        name: &str,
    ) -> ClubCalResult<FileAssociation> {
        self.check()?;
        let id = FileId::new(next_id());
        let record = FileRecord {
            event_id: event_id.clone(),
            url: url.to_string(),
            name: name.to_string(),
        };

        self.state
            .write()
            .await
            .files
            .push((id.clone(), record.clone()));

        Ok(FileAssociation::from_record(id, record))
    }

    async fn delete_file(&self, id: &FileId) -> ClubCalResult<()> {
        self.check()?;
        self.state
            .write()
            .await
            .files
            .retain(|(existing, _)| existing != id);
        Ok(())
    }
}

#[async_trait]
impl BlobStorage for MemoryBackend {
    async fn put(&self, path: &BlobPath, bytes: &[u8]) -> ClubCalResult<()> {
        self.check()?;
        self.state
            .write()
            .await
            .blobs
            .insert(path.as_str().to_string(), bytes.to_vec());
        Ok(())
    }

    async fn download_url(&self, path: &BlobPath) -> ClubCalResult<String> {
        self.check()?;
        if self.faults.download_urls_unavailable.load(Ordering::SeqCst) {
            return Err(ClubCalError::BackendUnavailable(format!(
                "no download URL for {}",
                path
            )));
        }
        if !self.state.read().await.blobs.contains_key(path.as_str()) {
            return Err(ClubCalError::BackendUnavailable(format!(
                "object not found: {}",
                path
            )));
        }
        Ok(format!("{}{}", URL_SCHEME, path))
    }

    async fn delete(&self, path: &BlobPath) -> ClubCalResult<()> {
        self.check()?;
        self.state.write().await.blobs.remove(path.as_str());
        Ok(())
    }
}

// =============================================================================
// Identity
// =============================================================================

struct Account {
    password: String,
    uid: OwnerId,
}

/// Email/password accounts kept in memory.
#[derive(Clone, Default)]
pub struct MemoryIdentity {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    sessions: SessionChannel,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_in(&self, credentials: &Credentials) -> ClubCalResult<Session> {
        let accounts = self.accounts.read().await;
        let account = accounts
            .get(&credentials.email)
            .ok_or_else(|| ClubCalError::AuthRejected("EMAIL_NOT_FOUND".into()))?;

        if account.password != credentials.password {
            return Err(ClubCalError::AuthRejected("INVALID_PASSWORD".into()));
        }

        let session = Session {
            uid: account.uid.clone(),
            email: Some(credentials.email.clone()),
        };
        self.sessions.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> ClubCalResult<Session> {
        if credentials.password.chars().count() < 6 {
            return Err(ClubCalError::AuthRejected("WEAK_PASSWORD".into()));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&credentials.email) {
            return Err(ClubCalError::AuthRejected("EMAIL_EXISTS".into()));
        }

        let uid = OwnerId::new(next_id());
        accounts.insert(
            credentials.email.clone(),
            Account {
                password: credentials.password.clone(),
                uid: uid.clone(),
            },
        );

        let session = Session {
            uid,
            email: Some(credentials.email.clone()),
        };
        self.sessions.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> ClubCalResult<()> {
        self.sessions.publish(None);
        Ok(())
    }

    fn sessions(&self) -> SessionChannel {
        self.sessions.clone()
    }
}
