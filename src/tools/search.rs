//! Query and enumeration tools.
//!
//! This module implements the `search_documents` (Mango selector queries) and
//! `list_documents` (`_all_docs` enumeration) MCP tools.

use crate::couch::types::{FindRequest, RowRev};
use crate::couch::ConnectionHolder;
use crate::error::{CouchError, CouchResult};
use crate::tools::ToolReply;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_SEARCH_LIMIT: u64 = 25;

/// Advisory appended to empty query results, pointing at the enumeration tool.
const EMPTY_RESULT_NOTE: &str = "No documents matched the query. To verify documents exist, \
     use list_documents with include_docs=true";

fn default_limit() -> u64 {
    DEFAULT_SEARCH_LIMIT
}

/// Input for the search_documents tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchDocumentsInput {
    /// Name of the database
    pub database: String,
    /// Mango query selector (e.g. {"name": "John"} for exact match,
    /// {"age": {"$gt": 18}} for comparisons)
    pub query: Value,
    /// Maximum number of documents to return (default: 25)
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Number of documents to skip (default: 0)
    #[serde(default)]
    pub skip: u64,
}

/// Output for the search_documents tool.
#[derive(Debug, Clone, Serialize)]
pub struct SearchDocumentsOutput {
    pub docs: Vec<Value>,
    pub count: usize,
    /// Server-emitted warning (e.g. no matching index), passed through verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Input for the list_documents tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListDocumentsInput {
    /// Name of the database
    pub database: String,
    /// Maximum number of documents to return
    #[serde(default)]
    pub limit: Option<u64>,
    /// Include full document content (default: false)
    #[serde(default)]
    pub include_docs: bool,
}

/// Output for the list_documents tool.
#[derive(Debug, Clone, Serialize)]
pub struct ListDocumentsOutput {
    pub documents: Vec<Value>,
    pub count: usize,
}

/// One enumeration entry when full bodies are not requested.
#[derive(Debug, Clone, Serialize)]
struct DocumentStub {
    id: String,
    key: String,
    value: RowRev,
}

pub struct SearchToolHandler {
    holder: Arc<ConnectionHolder>,
}

impl SearchToolHandler {
    pub fn new(holder: Arc<ConnectionHolder>) -> Self {
        Self { holder }
    }

    pub async fn search(&self, input: SearchDocumentsInput) -> CouchResult<ToolReply> {
        let client = self.holder.ensure_connected().await?;

        let request = FindRequest {
            selector: input.query,
            limit: input.limit,
            skip: input.skip,
        };

        // Primary path: typed _find. An Unsupported signal means the server
        // answered with a shape this client doesn't understand; the same
        // selector/limit/skip is then reissued over the raw query path.
        let (docs, warning) = match client.find(&input.database, &request).await {
            Ok(resp) => (resp.docs, resp.warning),
            Err(CouchError::Unsupported { operation }) => {
                warn!(database = %input.database, %operation, "Typed query path unsupported, falling back to raw query");
                let raw = client.find_raw(&input.database, &request).await?;
                let docs = raw
                    .get("docs")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                let warning = raw
                    .get("warning")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                (docs, warning)
            }
            Err(e) => return Err(e),
        };

        let count = docs.len();
        let note = (count == 0).then(|| EMPTY_RESULT_NOTE.to_string());

        info!(database = %input.database, count, "Searched documents");

        ToolReply::json(&SearchDocumentsOutput {
            docs,
            count,
            warning,
            note,
        })
    }

    pub async fn list(&self, input: ListDocumentsInput) -> CouchResult<ToolReply> {
        let client = self.holder.ensure_connected().await?;

        let resp = client
            .all_docs(&input.database, input.limit, input.include_docs)
            .await?;

        let documents: Vec<Value> = if input.include_docs {
            resp.rows
                .into_iter()
                .map(|row| row.doc.unwrap_or(Value::Null))
                .collect()
        } else {
            resp.rows
                .into_iter()
                .map(|row| {
                    serde_json::to_value(DocumentStub {
                        id: row.id,
                        key: row.key,
                        value: row.value,
                    })
                    .unwrap_or(Value::Null)
                })
                .collect()
        };
        let count = documents.len();

        info!(database = %input.database, count, include_docs = input.include_docs, "Listed documents");

        ToolReply::json(&ListDocumentsOutput { documents, count })
    }
}
