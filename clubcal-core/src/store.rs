//! Ports to the backend.
//!
//! The planner only talks to the backend through these traits. Adapters
//! implement them against a real service (see `clubcal-provider-firebase`)
//! or in memory (see [`crate::memory`]).

use async_trait::async_trait;

use crate::error::ClubCalResult;
use crate::event::{Event, EventFields, EventId, OwnerId};
use crate::file::{BlobPath, FileAssociation, FileId};

/// Durable per-user storage of events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Every event owned by `owner`, in no particular order.
    async fn list_events(&self, owner: &OwnerId) -> ClubCalResult<Vec<Event>>;

    /// Insert a new event; the store assigns its identifier.
    async fn create_event(&self, owner: &OwnerId, fields: &EventFields) -> ClubCalResult<Event>;

    /// Replace every mutable field of `id` and re-stamp its owner.
    ///
    /// Fails with `EventNotFound` when `id` does not exist.
    async fn update_event(
        &self,
        id: &EventId,
        owner: &OwnerId,
        fields: &EventFields,
    ) -> ClubCalResult<Event>;

    /// Remove an event. Removing a missing event succeeds.
    async fn delete_event(&self, id: &EventId) -> ClubCalResult<()>;
}

/// Links uploaded reports to events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileAssociationStore: Send + Sync {
    /// The first association recorded for `event_id`, if any.
    async fn find_file_for_event(
        &self,
        event_id: &EventId,
    ) -> ClubCalResult<Option<FileAssociation>>;

    /// Every association for `event_id`, in the order lookup sees them.
    async fn files_for_event(&self, event_id: &EventId) -> ClubCalResult<Vec<FileAssociation>>;

    /// Record a new association. Earlier associations for the event are left alone.
    async fn record_file(
        &self,
        event_id: &EventId,
        url: &str,
        name: &str,
    ) -> ClubCalResult<FileAssociation>;

    /// Remove one association. Removing a missing association succeeds.
    async fn delete_file(&self, id: &FileId) -> ClubCalResult<()>;
}

/// Raw bytes addressed by path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Write `bytes` at `path`, overwriting whatever was there.
    async fn put(&self, path: &BlobPath, bytes: &[u8]) -> ClubCalResult<()>;

    /// A URL from which the blob at `path` can be fetched.
    async fn download_url(&self, path: &BlobPath) -> ClubCalResult<String>;

    /// Remove the blob at `path`. Removing a missing blob succeeds.
    async fn delete(&self, path: &BlobPath) -> ClubCalResult<()>;
}
