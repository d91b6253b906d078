//! The planner: the signed-in user's events and the intents the views raise.
//!
//! It keeps a read model of the user's events, rebuilt from the store on
//! every session change and only mutated after the store confirms a write.
//! Store failures are logged here and handed back as a [`Notice`]; nothing
//! is retried.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{ClubCalConfig, DeletePolicy, ReportPolicy};
use crate::error::{ClubCalError, ClubCalResult};
use crate::event::{Event, EventFields, EventId};
use crate::file::{BlobPath, FileAssociation, LocalFile};
use crate::form::{EventForm, FormMode};
use crate::month::{CalendarMonth, events_in_month};
use crate::outcome::{Notice, Outcome};
use crate::session::{Session, SessionWatcher};
use crate::store::{BlobStorage, EventStore, FileAssociationStore};
use crate::upload::ReportUpload;

pub struct Planner {
    events: Arc<dyn EventStore>,
    files: Arc<dyn FileAssociationStore>,
    blobs: Arc<dyn BlobStorage>,
    report_policy: ReportPolicy,
    delete_policy: DeletePolicy,
    session: Option<Session>,
    cache: Vec<Event>,
}

impl Planner {
    pub fn new(
        events: Arc<dyn EventStore>,
        files: Arc<dyn FileAssociationStore>,
        blobs: Arc<dyn BlobStorage>,
    ) -> Self {
        Planner {
            events,
            files,
            blobs,
            report_policy: ReportPolicy::default(),
            delete_policy: DeletePolicy::default(),
            session: None,
            cache: Vec::new(),
        }
    }

    /// Use one backend for all three ports.
    pub fn with_backend<B>(backend: B) -> Self
    where
        B: EventStore + FileAssociationStore + BlobStorage + Clone + 'static,
    {
        Self::new(
            Arc::new(backend.clone()),
            Arc::new(backend.clone()),
            Arc::new(backend),
        )
    }

    pub fn with_policies(mut self, report_policy: ReportPolicy, delete_policy: DeletePolicy) -> Self {
        self.report_policy = report_policy;
        self.delete_policy = delete_policy;
        self
    }

    pub fn with_config(self, config: &ClubCalConfig) -> Self {
        self.with_policies(config.report_policy, config.delete_policy)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    // SESSION:

    /// Switch users. The read model is dropped and, if someone is signed in,
    /// reloaded from the store.
    pub async fn set_session(&mut self, session: Option<Session>) -> Outcome {
        self.cache.clear();
        self.session = session;

        match &self.session {
            Some(session) => {
                info!(uid = %session.uid, "session started");
                self.reload().await
            }
            None => {
                info!("signed out");
                Outcome::Done(())
            }
        }
    }

    /// Wait for the next session change and apply it.
    ///
    /// Returns `None` once the identity provider is gone.
    pub async fn follow(&mut self, watcher: &mut SessionWatcher) -> Option<Outcome> {
        let session = watcher.changed().await?;
        Some(self.set_session(session).await)
    }

    /// Fetch the signed-in user's events again.
    ///
    /// On failure the list is left empty.
    pub async fn reload(&mut self) -> Outcome {
        let Some(session) = &self.session else {
            return Outcome::Ignored;
        };
        let owner = session.uid.clone();

        debug!(uid = %owner, "listing events");
        match self.events.list_events(&owner).await {
            Ok(events) => {
                let (mine, foreign): (Vec<Event>, Vec<Event>) =
                    events.into_iter().partition(|e| e.owner == owner);
                if !foreign.is_empty() {
                    warn!(
                        uid = %owner,
                        dropped = foreign.len(),
                        "store returned events of another owner"
                    );
                }
                self.cache = mine;
                Outcome::Done(())
            }
            Err(err) => {
                error!(error = %err, "failed to fetch events");
                self.cache.clear();
                Outcome::Failed(Notice::from_error("load your events", &err))
            }
        }
    }

    // READ MODEL:

    pub fn events(&self) -> &[Event] {
        &self.cache
    }

    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.cache.iter().find(|e| &e.id == id)
    }

    pub fn events_in_month(&self, month: CalendarMonth) -> Vec<&Event> {
        events_in_month(&self.cache, month)
    }

    // EVENT INTENTS:

    pub async fn create_event(&mut self, fields: EventFields) -> Outcome<Event> {
        let Some(session) = &self.session else {
            return Outcome::Ignored;
        };

        debug!(title = %fields.title, date = %fields.date, "creating event");
        match self.events.create_event(&session.uid, &fields).await {
            Ok(event) => {
                self.cache.push(event.clone());
                Outcome::Done(event)
            }
            Err(err) => {
                error!(error = %err, "failed to add event");
                Outcome::Failed(Notice::from_error("add the event", &err))
            }
        }
    }

    /// Replace an event of the read model. Ids the signed-in user was never
    /// given fail with `EventNotFound` before the store is asked.
    pub async fn update_event(&mut self, id: &EventId, fields: EventFields) -> Outcome<Event> {
        let Some(session) = &self.session else {
            return Outcome::Ignored;
        };
        if self.event(id).is_none() {
            warn!(event_id = %id, "refusing to update an event outside the read model");
            let err = ClubCalError::EventNotFound(id.clone());
            return Outcome::Failed(Notice::from_error("update the event", &err));
        }

        debug!(event_id = %id, "updating event");
        match self.events.update_event(id, &session.uid, &fields).await {
            Ok(event) => {
                if let Some(cached) = self.cache.iter_mut().find(|e| &e.id == id) {
                    *cached = event.clone();
                }
                Outcome::Done(event)
            }
            Err(err) => {
                error!(event_id = %id, error = %err, "failed to update event");
                Outcome::Failed(Notice::from_error("update the event", &err))
            }
        }
    }

    /// Delete an event of the read model. Anything else is ignored.
    pub async fn delete_event(&mut self, id: &EventId) -> Outcome {
        if self.session.is_none() {
            return Outcome::Ignored;
        }
        if self.event(id).is_none() {
            debug!(event_id = %id, "not in the read model, nothing to delete");
            return Outcome::Ignored;
        }

        debug!(event_id = %id, "deleting event");
        if let Err(err) = self.events.delete_event(id).await {
            error!(event_id = %id, error = %err, "failed to delete event");
            return Outcome::Failed(Notice::from_error("delete the event", &err));
        }
        self.cache.retain(|e| &e.id != id);

        if self.delete_policy == DeletePolicy::Cascade
            && let Err(err) = self.remove_reports(id).await
        {
            warn!(event_id = %id, error = %err, "event deleted but its reports were not");
        }

        Outcome::Done(())
    }

    /// Submit the modal form: create or update depending on its mode.
    ///
    /// The form is closed and cleared only when the store accepted the change.
    pub async fn submit(&mut self, form: &mut EventForm) -> Outcome<Event> {
        if self.session.is_none() {
            return Outcome::Ignored;
        }

        let action = match form.mode() {
            FormMode::Creating => "add the event",
            FormMode::Editing(_) => "update the event",
        };
        let fields = match form.fields() {
            Ok(fields) => fields,
            Err(err) => return Outcome::Failed(Notice::from_error(action, &err)),
        };

        let outcome = match form.mode().clone() {
            FormMode::Creating => self.create_event(fields).await,
            FormMode::Editing(id) => self.update_event(&id, fields).await,
        };

        if outcome.is_done() {
            form.cancel();
        }
        outcome
    }

    // REPORTS:

    /// The report to open for an event ("View File").
    pub async fn report_for(&self, event_id: &EventId) -> Outcome<Option<FileAssociation>> {
        if self.session.is_none() {
            return Outcome::Ignored;
        }

        match self.files.find_file_for_event(event_id).await {
            Ok(found) => Outcome::Done(found),
            Err(err) => {
                error!(event_id = %event_id, error = %err, "failed to look up report");
                Outcome::Failed(Notice::from_error("open the report", &err))
            }
        }
    }

    /// URL to open for an event's report; tells the user when there is none.
    pub async fn view_report(&self, event_id: &EventId) -> Outcome<String> {
        match self.report_for(event_id).await {
            Outcome::Done(Some(association)) => Outcome::Done(association.url),
            Outcome::Done(None) => Outcome::Failed(Notice::no_report()),
            Outcome::Ignored => Outcome::Ignored,
            Outcome::Failed(notice) => Outcome::Failed(notice),
        }
    }

    /// Upload the chosen file as a report for the selected event.
    ///
    /// A no-op unless both an event and a file are chosen and no other upload
    /// is running. The event must be one of the signed-in user's. The in-flight flag is cleared however the upload ends; the
    /// selection is cleared only on success.
    pub async fn upload_report(&mut self, upload: &mut ReportUpload) -> Outcome<FileAssociation> {
        if self.session.is_none() {
            return Outcome::Ignored;
        }
        let (Some(event), Some(file)) = (upload.selected_event(), upload.file()) else {
            return Outcome::Ignored;
        };
        if self.event(&event.id).is_none() {
            warn!(event_id = %event.id, "refusing to upload for an event outside the read model");
            let err = ClubCalError::EventNotFound(event.id.clone());
            return Outcome::Failed(Notice::from_error("upload the report", &err));
        }
        let Some(_in_flight) = upload.begin() else {
            debug!("upload already in progress");
            return Outcome::Ignored;
        };

        let event_id = event.id.clone();
        let result = self.store_report(&event_id, file).await;

        match result {
            Ok(association) => {
                info!(event_id = %event_id, name = %association.name, "report uploaded");
                upload.finish();
                Outcome::Done(association)
            }
            Err(err) => {
                error!(event_id = %event_id, error = %err, "failed to upload report");
                Outcome::Failed(Notice::from_error("upload the report", &err))
            }
        }
    }

    async fn store_report(
        &self,
        event_id: &EventId,
        file: &LocalFile,
    ) -> ClubCalResult<FileAssociation> {
        let path = BlobPath::report(event_id, &file.name);

        self.blobs
            .put(&path, &file.bytes)
            .await
            .map_err(ClubCalError::upload)?;
        let url = self
            .blobs
            .download_url(&path)
            .await
            .map_err(ClubCalError::upload)?;

        let association = self.files.record_file(event_id, &url, &file.name).await?;

        if self.report_policy == ReportPolicy::Replace
            && let Err(err) = self.prune_reports(event_id, &association).await
        {
            warn!(event_id = %event_id, error = %err, "earlier reports were not removed");
        }

        Ok(association)
    }

    /// Remove every association of `event_id` except `keep`, with their blobs.
    async fn prune_reports(&self, event_id: &EventId, keep: &FileAssociation) -> ClubCalResult<()> {
        let keep_path = keep.blob_path();

        for earlier in self.files.files_for_event(event_id).await? {
            if earlier.id == keep.id {
                continue;
            }
            self.files.delete_file(&earlier.id).await?;

            let earlier_path = earlier.blob_path();
            if earlier_path != keep_path {
                self.blobs.delete(&earlier_path).await?;
            }
        }
        Ok(())
    }

    async fn remove_reports(&self, event_id: &EventId) -> ClubCalResult<()> {
        for association in self.files.files_for_event(event_id).await? {
            self.blobs.delete(&association.blob_path()).await?;
            self.files.delete_file(&association.id).await?;
        }
        Ok(())
    }
}
