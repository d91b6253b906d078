//! Club event types.
//!
//! `EventRecord` is the stored shape (`{ uid, title, organizedFor, inCharge,
//! date, details }`); `Event` pairs a record with the identifier the store
//! assigned to it.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Store-assigned event identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        EventId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        EventId(id.to_string())
    }
}

/// Identifier of the user who owns an event, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(uid: impl Into<String>) -> Self {
        OwnerId(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(uid: &str) -> Self {
        OwnerId(uid.to_string())
    }
}

/// The user-editable part of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    #[serde(default)]
    pub title: String,
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub organized_for: String,
    #[serde(default)]
    pub in_charge: String,
    #[serde(default)]
    pub details: String,
}

impl EventFields {
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        EventFields {
            title: title.into(),
            date,
            organized_for: String::new(),
            in_charge: String::new(),
            details: String::new(),
        }
    }
}

/// An event as persisted by the backend, without its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub uid: OwnerId,
    #[serde(flatten)]
    pub fields: EventFields,
}

/// A stored club event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub owner: OwnerId,
    pub fields: EventFields,
}

impl Event {
    pub fn from_record(id: EventId, record: EventRecord) -> Self {
        Event {
            id,
            owner: record.uid,
            fields: record.fields,
        }
    }

    pub fn record(&self) -> EventRecord {
        EventRecord {
            uid: self.owner.clone(),
            fields: self.fields.clone(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.fields.date
    }

    pub fn title(&self) -> &str {
        &self.fields.title
    }
}

/// Parse an ISO-like date string into a calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (the local date of the offset is
/// kept) and offset-less `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_event_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Serde adapter storing dates as `YYYY-MM-DD` strings.
mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_event_date(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid event date '{}'", raw)))
    }
}
