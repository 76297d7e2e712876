//! Record wire format and request normalization.

use bytes::Bytes;
use reqwest::header::HeaderValue;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProxyError, ProxyResult};

/// Column name → cell value.
pub type Fields = Map<String, Value>;

/// Pantry collections exposed by the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Locations,
    Food,
}

impl Collection {
    /// Inbound path segment for this collection.
    pub fn path(self) -> &'static str {
        match self {
            Collection::Locations => "locations",
            Collection::Food => "food",
        }
    }
}

/// One row in a document table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub fields: Fields,
}

/// The `{ "records": [...] }` envelope every write is sent in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordBatch {
    pub records: Vec<Record>,
}

impl RecordBatch {
    /// Normalize a create body into a batch.
    ///
    /// Accepted shapes:
    /// - a bare field map: `{"Name": "Milk"}`
    /// - one wrapped record: `{"fields": {"Name": "Milk"}}`
    /// - an array of either of the above
    /// - a pre-wrapped batch: `{"records": [...]}`
    pub fn from_create_body(body: Value) -> ProxyResult<Self> {
        let items = match body {
            Value::Object(mut obj) => match obj.remove("records") {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(ProxyError::validation("`records` must be an array"));
                }
                None => vec![Value::Object(obj)],
            },
            Value::Array(items) => items,
            _ => {
                return Err(ProxyError::validation(
                    "request body must be an object or an array of objects",
                ))
            }
        };

        if items.is_empty() {
            return Err(ProxyError::validation("no records to create"));
        }

        let records = items
            .into_iter()
            .map(record_from_value)
            .collect::<ProxyResult<Vec<_>>>()?;
        Ok(Self { records })
    }

    /// Single-record patch for `id`. A body shaped `{"fields": {...}}` is
    /// unwrapped; any other object is taken as the field map itself.
    pub fn from_update_body(id: i64, body: Value) -> ProxyResult<Self> {
        let fields = match body {
            Value::Object(mut obj) => match obj.remove("fields") {
                Some(Value::Object(fields)) if obj.is_empty() || obj.contains_key("id") => fields,
                Some(other) => {
                    obj.insert("fields".to_string(), other);
                    obj
                }
                None => obj,
            },
            _ => return Err(ProxyError::validation("request body must be an object of fields")),
        };

        Ok(Self {
            records: vec![Record {
                id: Some(id),
                fields,
            }],
        })
    }
}

fn record_from_value(value: Value) -> ProxyResult<Record> {
    let Value::Object(mut obj) = value else {
        return Err(ProxyError::validation("each record must be an object"));
    };

    match obj.remove("fields") {
        Some(Value::Object(fields)) => {
            let id = obj.get("id").and_then(Value::as_i64);
            Ok(Record { id, fields })
        }
        // A column literally named "fields"; keep it as data.
        Some(other) => {
            obj.insert("fields".to_string(), other);
            Ok(Record { id: None, fields: obj })
        }
        None => Ok(Record { id: None, fields: obj }),
    }
}

/// A successful upstream answer, relayed to the caller unchanged.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}
