//! Firestore document wire format.
//!
//! Firestore wraps every field in a typed value, so `{"title": "AGM"}` is
//! sent as `{"fields": {"title": {"stringValue": "AGM"}}}`. Records are
//! converted through `serde_json::Value` so their own serde attributes
//! decide the field names.

use std::collections::BTreeMap;

use clubcal_core::{ClubCalError, ClubCalResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};

/// A typed Firestore value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    StringValue(String),
    /// int64 travels as a decimal string.
    IntegerValue(String),
    DoubleValue(f64),
    BooleanValue(bool),
    TimestampValue(String),
    ReferenceValue(String),
    NullValue(Json),
    MapValue(MapValue),
    ArrayValue(ArrayValue),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

/// A stored document. `name` is the full resource path and is empty on writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Document {
    /// Build a document body from any record that serializes to a JSON object.
    pub fn from_record<T: Serialize>(record: &T) -> ClubCalResult<Self> {
        match serde_json::to_value(record)? {
            Json::Object(map) => Ok(Document {
                name: String::new(),
                fields: encode_map(map),
            }),
            other => Err(ClubCalError::Serialization(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }

    pub fn to_record<T: DeserializeOwned>(&self) -> ClubCalResult<T> {
        Ok(serde_json::from_value(decode_map(&self.fields))?)
    }

    /// The last path segment of `name`, which is the document id.
    pub fn id(&self) -> Option<&str> {
        self.name.rsplit('/').next().filter(|id| !id.is_empty())
    }
}

/// One element of a `runQuery` response stream. Elements without a
/// document only carry progress information.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub document: Option<Document>,
}

/// Collect the documents out of a `runQuery` response.
pub fn documents(results: Vec<QueryResult>) -> Vec<Document> {
    results.into_iter().filter_map(|r| r.document).collect()
}

fn encode_map(map: Map<String, Json>) -> BTreeMap<String, Value> {
    map.into_iter().map(|(k, v)| (k, encode(v))).collect()
}

fn encode(json: Json) -> Value {
    match json {
        Json::Null => Value::NullValue(Json::String("NULL_VALUE".into())),
        Json::Bool(b) => Value::BooleanValue(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::IntegerValue(i.to_string()),
            None => Value::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Json::String(s) => Value::StringValue(s),
        Json::Array(items) => Value::ArrayValue(ArrayValue {
            values: items.into_iter().map(encode).collect(),
        }),
        Json::Object(map) => Value::MapValue(MapValue {
            fields: encode_map(map),
        }),
    }
}

fn decode_map(fields: &BTreeMap<String, Value>) -> Json {
    Json::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), decode(v)))
            .collect(),
    )
}

fn decode(value: &Value) -> Json {
    match value {
        Value::StringValue(s) | Value::TimestampValue(s) | Value::ReferenceValue(s) => {
            Json::String(s.clone())
        }
        Value::IntegerValue(s) => s
            .parse::<i64>()
            .map(|i| Json::Number(i.into()))
            .unwrap_or_else(|_| Json::String(s.clone())),
        Value::DoubleValue(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::BooleanValue(b) => Json::Bool(*b),
        Value::NullValue(_) => Json::Null,
        Value::MapValue(map) => decode_map(&map.fields),
        Value::ArrayValue(array) => Json::Array(array.values.iter().map(decode).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use clubcal_core::{EventFields, EventId, EventRecord, FileRecord, OwnerId};
    use serde_json::json;

    fn sample_record() -> EventRecord {
        let mut fields = EventFields::new("AGM", NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        fields.organized_for = "Members".into();
        fields.in_charge = "Sam".into();
        EventRecord {
            uid: OwnerId::new("user-1"),
            fields,
        }
    }

    #[test]
    fn test_event_record_wire_shape() {
        let doc = Document::from_record(&sample_record()).unwrap();
        let body = serde_json::to_value(&doc).unwrap();

        assert_eq!(body["fields"]["uid"], json!({"stringValue": "user-1"}));
        assert_eq!(body["fields"]["date"], json!({"stringValue": "2024-03-09"}));
        assert_eq!(
            body["fields"]["organizedFor"],
            json!({"stringValue": "Members"})
        );
        assert_eq!(body["fields"]["details"], json!({"stringValue": ""}));
        assert!(body.get("name").is_none());
    }

    #[test]
    fn test_decode_firestore_document() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/club/databases/(default)/documents/files/f42",
            "fields": {
                "eventId": {"stringValue": "e7"},
                "url": {"stringValue": "https://example.test/r.pdf"},
                "name": {"stringValue": "r.pdf"}
            },
            "createTime": "2024-03-09T10:00:00Z",
            "updateTime": "2024-03-09T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(doc.id(), Some("f42"));
        let record: FileRecord = doc.to_record().unwrap();
        assert_eq!(record.event_id, EventId::new("e7"));
        assert_eq!(record.name, "r.pdf");
    }

    #[test]
    fn test_missing_optional_fields_decode_as_empty() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/club/databases/(default)/documents/events/e1",
            "fields": {
                "uid": {"stringValue": "user-1"},
                "title": {"stringValue": "Picnic"},
                "date": {"stringValue": "2024-06-01"}
            }
        }))
        .unwrap();

        let record: EventRecord = doc.to_record().unwrap();
        assert_eq!(record.fields.title, "Picnic");
        assert_eq!(record.fields.in_charge, "");
    }

    #[test]
    fn test_undecodable_date_is_an_error() {
        let doc: Document = serde_json::from_value(json!({
            "name": "projects/club/databases/(default)/documents/events/e1",
            "fields": {
                "uid": {"stringValue": "user-1"},
                "date": {"stringValue": "someday"}
            }
        }))
        .unwrap();

        assert!(doc.to_record::<EventRecord>().is_err());
    }

    #[test]
    fn test_scalar_values() {
        let doc = Document::from_record(&json!({
            "count": 3,
            "ratio": 0.5,
            "done": true,
            "gone": null,
            "tags": ["a"],
            "nested": {"k": "v"}
        }))
        .unwrap();

        assert_eq!(doc.fields["count"], Value::IntegerValue("3".into()));
        assert_eq!(doc.fields["ratio"], Value::DoubleValue(0.5));
        assert_eq!(doc.fields["done"], Value::BooleanValue(true));

        let back: Json = doc.to_record().unwrap();
        assert_eq!(back["count"], json!(3));
        assert_eq!(back["gone"], Json::Null);
        assert_eq!(back["tags"], json!(["a"]));
        assert_eq!(back["nested"]["k"], json!("v"));
    }

    #[test]
    fn test_non_object_record_rejected() {
        assert!(Document::from_record(&"just a string").is_err());
    }

    #[test]
    fn test_query_results_skip_progress_entries() {
        let results: Vec<QueryResult> = serde_json::from_value(json!([
            {"readTime": "2024-03-09T10:00:00Z"}
        ]))
        .unwrap();
        assert!(documents(results).is_empty());

        let results: Vec<QueryResult> = serde_json::from_value(json!([
            {"document": {"name": "projects/p/databases/(default)/documents/events/a", "fields": {}}, "readTime": "x"},
            {"document": {"name": "projects/p/databases/(default)/documents/events/b", "fields": {}}, "readTime": "x"}
        ]))
        .unwrap();
        let docs = documents(results);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].id(), Some("b"));
    }
}
