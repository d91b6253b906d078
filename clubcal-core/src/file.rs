//! Report attachments: blob paths, local files and the association records
//! linking an uploaded report to an event.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::REPORTS_PREFIX;
use crate::event::EventId;

/// Store-assigned identifier of a file association.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        FileId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file association as persisted by the backend (`{ eventId, url, name }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub event_id: EventId,
    pub url: String,
    pub name: String,
}

/// An uploaded report linked to an event.
///
/// The event reference is weak: nothing stops an association from outliving
/// its event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAssociation {
    pub id: FileId,
    pub event_id: EventId,
    pub url: String,
    pub name: String,
}

impl FileAssociation {
    pub fn from_record(id: FileId, record: FileRecord) -> Self {
        FileAssociation {
            id,
            event_id: record.event_id,
            url: record.url,
            name: record.name,
        }
    }

    /// Where the report's bytes live, assuming it was uploaded under its display name.
    pub fn blob_path(&self) -> BlobPath {
        BlobPath::report(&self.event_id, &self.name)
    }
}

/// Path of a blob inside blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobPath(String);

impl BlobPath {
    /// `reports/<eventId>/<fileName>`; re-uploading the same name overwrites.
    pub fn report(event_id: &EventId, file_name: &str) -> Self {
        BlobPath(format!("{}/{}/{}", REPORTS_PREFIX, event_id, file_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file chosen by the user for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        LocalFile {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
