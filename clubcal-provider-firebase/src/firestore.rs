//! Events and file associations as Firestore documents.

use async_trait::async_trait;
use clubcal_core::constants::{EVENTS_COLLECTION, FILES_COLLECTION};
use clubcal_core::store::{EventStore, FileAssociationStore};
use clubcal_core::{
    ClubCalError, ClubCalResult, Event, EventFields, EventId, EventRecord, FileAssociation,
    FileId, FileRecord, OwnerId,
};
use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, warn};

use crate::client::{FirebaseClient, expect_success};
use crate::document::{Document, QueryResult, documents};

/// Document-store adapter for the `events` and `files` collections.
#[derive(Clone)]
pub struct FirestoreStore {
    client: FirebaseClient,
}

impl FirestoreStore {
    pub fn new(client: FirebaseClient) -> Self {
        FirestoreStore { client }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.client.documents_url(), collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.client.documents_url(), collection, id)
    }

    /// Every document in `collection` whose `field` equals `value`.
    async fn query_equal(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> ClubCalResult<Vec<Document>> {
        let token = self.client.bearer().await?;
        let url = format!("{}:runQuery", self.client.documents_url());

        let response = self
            .client
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&equality_query(collection, field, value))
            .send()
            .await
            .map_err(ClubCalError::backend)?;

        let results: Vec<QueryResult> = expect_success(response)
            .await?
            .json()
            .await
            .map_err(ClubCalError::backend)?;

        Ok(documents(results))
    }

    async fn create(&self, collection: &str, body: &Document) -> ClubCalResult<Document> {
        let token = self.client.bearer().await?;

        let response = self
            .client
            .http
            .post(self.collection_url(collection))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(ClubCalError::backend)?;

        expect_success(response)
            .await?
            .json()
            .await
            .map_err(ClubCalError::backend)
    }

    /// Delete a document; a missing document counts as deleted.
    async fn remove(&self, collection: &str, id: &str) -> ClubCalResult<()> {
        let token = self.client.bearer().await?;

        let response = self
            .client
            .http
            .delete(self.document_url(collection, id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(ClubCalError::backend)?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(collection, id, "document already gone");
            return Ok(());
        }

        expect_success(response).await?;
        Ok(())
    }
}

/// `runQuery` body selecting `collection` documents where `field == value`.
fn equality_query(collection: &str, field: &str, value: &str) -> serde_json::Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": { "stringValue": value }
                }
            }
        }
    })
}

fn event_from_document(doc: &Document) -> ClubCalResult<Event> {
    let id = doc
        .id()
        .ok_or_else(|| ClubCalError::Serialization(format!("bad document name '{}'", doc.name)))?;
    let record: EventRecord = doc.to_record()?;
    Ok(Event::from_record(EventId::new(id), record))
}

fn file_from_document(doc: &Document) -> ClubCalResult<FileAssociation> {
    let id = doc
        .id()
        .ok_or_else(|| ClubCalError::Serialization(format!("bad document name '{}'", doc.name)))?;
    let record: FileRecord = doc.to_record()?;
    Ok(FileAssociation::from_record(FileId::new(id), record))
}

/// Convert what decodes; log and skip the rest.
fn decode_all<T>(
    docs: Vec<Document>,
    convert: impl Fn(&Document) -> ClubCalResult<T>,
) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match convert(doc) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(document = %doc.name, error = %e, "skipping undecodable document");
                None
            }
        })
        .collect()
}

#[async_trait]
impl EventStore for FirestoreStore {
    async fn list_events(&self, owner: &OwnerId) -> ClubCalResult<Vec<Event>> {
        let docs = self
            .query_equal(EVENTS_COLLECTION, "uid", owner.as_str())
            .await?;
        Ok(decode_all(docs, event_from_document))
    }

    async fn create_event(&self, owner: &OwnerId, fields: &EventFields) -> ClubCalResult<Event> {
        let record = EventRecord {
            uid: owner.clone(),
            fields: fields.clone(),
        };
        let created = self
            .create(EVENTS_COLLECTION, &Document::from_record(&record)?)
            .await?;
        event_from_document(&created)
    }

    async fn update_event(
        &self,
        id: &EventId,
        owner: &OwnerId,
        fields: &EventFields,
    ) -> ClubCalResult<Event> {
        let token = self.client.bearer().await?;
        let record = EventRecord {
            uid: owner.clone(),
            fields: fields.clone(),
        };

        let response = self
            .client
            .http
            .patch(self.document_url(EVENTS_COLLECTION, id.as_str()))
            .query(&[("currentDocument.exists", "true")])
            .bearer_auth(token)
            .json(&Document::from_record(&record)?)
            .send()
            .await
            .map_err(ClubCalError::backend)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClubCalError::EventNotFound(id.clone()));
        }

        let updated: Document = expect_success(response)
            .await?
            .json()
            .await
            .map_err(ClubCalError::backend)?;
        event_from_document(&updated)
    }

    async fn delete_event(&self, id: &EventId) -> ClubCalResult<()> {
        self.remove(EVENTS_COLLECTION, id.as_str()).await
    }
}

#[async_trait]
impl FileAssociationStore for FirestoreStore {
    async fn find_file_for_event(
        &self,
        event_id: &EventId,
    ) -> ClubCalResult<Option<FileAssociation>> {
        Ok(self.files_for_event(event_id).await?.into_iter().next())
    }

    async fn files_for_event(&self, event_id: &EventId) -> ClubCalResult<Vec<FileAssociation>> {
        let docs = self
            .query_equal(FILES_COLLECTION, "eventId", event_id.as_str())
            .await?;
        Ok(decode_all(docs, file_from_document))
    }

    async fn record_file(
        &self,
        event_id: &EventId,
        url: &str,
        name: &str,
    ) -> ClubCalResult<FileAssociation> {
        let record = FileRecord {
            event_id: event_id.clone(),
            url: url.to_string(),
            name: name.to_string(),
        };
        let created = self
            .create(FILES_COLLECTION, &Document::from_record(&record)?)
            .await?;
        file_from_document(&created)
    }

    async fn delete_file(&self, id: &FileId) -> ClubCalResult<()> {
        self.remove(FILES_COLLECTION, id.as_str()).await
    }
}
