//! Defines a _record_, the unit of work for the resizer: one object
//! identified by bucket and key. Records are built from S3 event
//! notifications.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::{instrument, warn};

/// The notification payload. Only the record list is looked at, and
/// each record is parsed on its own.
#[derive(Deserialize)]
struct Payload {
    #[serde(rename = "Records", default)]
    records: Option<Vec<Value>>,
}

/// The part of a notification record that names the object. Every
/// other field of the event is ignored.
#[derive(Deserialize)]
struct EventRecord {
    s3: Option<EventEntity>,
}

#[derive(Deserialize)]
struct EventEntity {
    bucket: Option<EventBucket>,
    object: Option<EventObject>,
}

#[derive(Deserialize)]
struct EventBucket {
    name: Option<String>,
}

#[derive(Deserialize)]
struct EventObject {
    key: Option<String>,
}

/// A single object to be resized in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for NotificationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Object keys arrive URL-encoded in S3 notifications, with spaces
/// turned into `+`.
fn decode_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(key) => key.into_owned(),
        Err(e) => {
            warn!("Couldn't decode object key {:?}, using it as is: {}", raw, e);
            String::from(raw)
        }
    }
}

impl NotificationRecord {
    /// Builds a record, unless the bucket or the key is empty.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Option<Self> {
        let (bucket, key) = (bucket.into(), key.into());
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some(NotificationRecord { bucket, key })
    }

    /// Builds a record from a single notification record, unless it
    /// lacks the storage event or its bucket name or object key.
    fn from_event_record(record: EventRecord) -> Option<Self> {
        let s3 = record.s3?;
        let bucket = s3.bucket?.name?;
        let key = s3.object?.key?;
        Self::new(bucket, decode_key(&key))
    }

    /// Builds a vector of records from a raw invocation payload.
    /// Records without a bucket name or an object key are skipped
    /// without affecting the others. A payload without records, or
    /// one that isn't a notification at all, yields no records.
    #[instrument(skip_all)]
    pub fn from_payload(payload: Value) -> Vec<Self> {
        let records = match serde_json::from_value::<Payload>(payload) {
            Ok(payload) => payload.records.unwrap_or_default(),
            Err(e) => {
                warn!("Couldn't parse the invocation payload as an S3 event: {:?}", e);
                return Vec::new();
            }
        };
        records
            .into_iter()
            .filter_map(|record| {
                serde_json::from_value::<EventRecord>(record)
                    .map_err(|e| warn!("Couldn't parse an S3 event record: {:?}", e))
                    .ok()
            })
            .filter_map(Self::from_event_record)
            .collect()
    }
}
