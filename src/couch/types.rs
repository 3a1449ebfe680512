//! Wire types for the CouchDB REST API.
//!
//! These mirror the JSON shapes CouchDB sends and receives. Only the fields
//! this server consumes are modeled; anything else is carried loosely as
//! `serde_json::Value` so server-side additions don't break decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response to `GET /` - the server welcome message with version info.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerWelcome {
    #[serde(default)]
    pub couchdb: Option<String>,
    pub version: String,
}

/// Acknowledgement for document writes and deletes.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteAck {
    #[serde(default)]
    pub ok: bool,
    pub id: String,
    pub rev: String,
}

/// Body for `POST /{db}/_find` - a Mango query.
#[derive(Debug, Clone, Serialize)]
pub struct FindRequest {
    pub selector: Value,
    pub limit: u64,
    pub skip: u64,
}

/// Typed response from `POST /{db}/_find`.
#[derive(Debug, Clone, Deserialize)]
pub struct FindResponse {
    pub docs: Vec<Value>,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub bookmark: Option<String>,
}

/// The `value` member of an `_all_docs` row: the current revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowRev {
    pub rev: String,
}

/// One row of a `GET /{db}/_all_docs` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    pub key: String,
    pub value: RowRev,
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Response from `GET /{db}/_all_docs`.
#[derive(Debug, Clone, Deserialize)]
pub struct AllDocsResponse {
    pub total_rows: u64,
    #[serde(default)]
    pub offset: Option<u64>,
    pub rows: Vec<AllDocsRow>,
}

/// The `index` member of an index creation request: the ordered field list.
#[derive(Debug, Clone, Serialize)]
pub struct IndexFields {
    pub fields: Vec<String>,
}

/// Body for `POST /{db}/_index` - a JSON-type index over document fields.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIndexRequest {
    pub index: IndexFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub index_type: String,
}

impl CreateIndexRequest {
    /// Build a JSON-type index request over the given fields.
    pub fn json(fields: Vec<String>, name: Option<String>) -> Self {
        Self {
            index: IndexFields { fields },
            name,
            index_type: "json".to_string(),
        }
    }
}

/// Response from `POST /{db}/_index`. `result` is "created" for a new index
/// and "exists" when an equivalent index was already present.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIndexResponse {
    pub result: String,
    pub id: String,
    pub name: String,
}

/// Response from `GET /{db}/_index`. Index definitions are passed through
/// verbatim; their shape (`ddoc`/`name`/`type`/`def`) is CouchDB's to define.
#[derive(Debug, Clone, Deserialize)]
pub struct ListIndexesResponse {
    pub total_rows: u64,
    pub indexes: Vec<Value>,
}

/// CouchDB's error body: `{"error": "...", "reason": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ErrorBody {
    /// Render error and reason as a single line for messages.
    pub fn describe(&self) -> String {
        match &self.reason {
            Some(reason) if !reason.is_empty() => format!("{}: {}", self.error, reason),
            _ => self.error.clone(),
        }
    }
}
