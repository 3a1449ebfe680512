//! Document CRUD tools.
//!
//! This module implements the `create_document`, `get_document`,
//! `update_document`, and `delete_document` MCP tools. Updates and deletes
//! ride CouchDB's optimistic concurrency: the caller supplies the current
//! `_rev`, and a stale revision is reported back as a conflict message, never
//! silently retried or overwritten.

use crate::couch::ConnectionHolder;
use crate::error::{CouchError, CouchResult};
use crate::tools::ToolReply;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Input for the create_document tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateDocumentInput {
    /// Name of the database
    pub database: String,
    /// Document data as JSON object
    pub document: Value,
    /// Optional document ID (if not provided, CouchDB generates one)
    #[serde(default)]
    pub doc_id: Option<String>,
}

/// Input for the get_document tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetDocumentInput {
    /// Name of the database
    pub database: String,
    /// Document ID
    pub doc_id: String,
}

/// Input for the update_document tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateDocumentInput {
    /// Name of the database
    pub database: String,
    /// Document ID
    pub doc_id: String,
    /// Updated document data (must include the current _rev)
    pub document: Value,
}

/// Input for the delete_document tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteDocumentInput {
    /// Name of the database
    pub database: String,
    /// Document ID
    pub doc_id: String,
    /// Document revision (_rev)
    pub rev: String,
}

/// Output for document writes: the stored id, the new revision, and a status
/// message.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentWriteOutput {
    pub id: String,
    pub rev: String,
    pub message: String,
}

pub struct DocumentToolHandler {
    holder: Arc<ConnectionHolder>,
}

impl DocumentToolHandler {
    pub fn new(holder: Arc<ConnectionHolder>) -> Self {
        Self { holder }
    }

    /// Documents must be JSON objects; anything else can't carry `_id`/`_rev`.
    fn require_object(document: &Value) -> CouchResult<()> {
        if document.is_object() {
            Ok(())
        } else {
            Err(CouchError::invalid_input("document must be a JSON object"))
        }
    }

    pub async fn create(&self, input: CreateDocumentInput) -> CouchResult<ToolReply> {
        Self::require_object(&input.document)?;
        let client = self.holder.ensure_connected().await?;

        let ack = match &input.doc_id {
            Some(doc_id) => {
                let mut document = input.document.clone();
                document["_id"] = Value::String(doc_id.clone());
                client.put_doc(&input.database, doc_id, &document).await?
            }
            None => client.insert_doc(&input.database, &input.document).await?,
        };

        info!(database = %input.database, id = %ack.id, "Created document");

        ToolReply::json(&DocumentWriteOutput {
            id: ack.id,
            rev: ack.rev,
            message: "Document created successfully".to_string(),
        })
    }

    pub async fn get(&self, input: GetDocumentInput) -> CouchResult<ToolReply> {
        let client = self.holder.ensure_connected().await?;
        let doc = client.get_doc(&input.database, &input.doc_id).await?;

        info!(database = %input.database, id = %input.doc_id, "Fetched document");

        ToolReply::json(&doc)
    }

    pub async fn update(&self, input: UpdateDocumentInput) -> CouchResult<ToolReply> {
        Self::require_object(&input.document)?;
        let client = self.holder.ensure_connected().await?;

        // The body's _id wins when present; otherwise the doc_id argument is
        // injected so the saved document always carries its identifier.
        let mut document = input.document.clone();
        let body_id = document
            .get("_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        let id = match body_id {
            Some(id) => id,
            None => {
                document["_id"] = Value::String(input.doc_id.clone());
                input.doc_id.clone()
            }
        };

        let result = client.put_doc(&input.database, &id, &document).await;
        let ack = match result {
            Err(CouchError::Conflict { .. }) => {
                return Ok(ToolReply::message(
                    "Document update conflict - the document was modified, \
                     fetch the latest revision and try again",
                ));
            }
            other => other?,
        };

        info!(database = %input.database, id = %ack.id, rev = %ack.rev, "Updated document");

        ToolReply::json(&DocumentWriteOutput {
            id: ack.id,
            rev: ack.rev,
            message: "Document updated successfully".to_string(),
        })
    }

    pub async fn delete(&self, input: DeleteDocumentInput) -> CouchResult<ToolReply> {
        let client = self.holder.ensure_connected().await?;

        let result = client
            .delete_doc(&input.database, &input.doc_id, &input.rev)
            .await;
        match result {
            Err(CouchError::Conflict { .. }) => {
                return Ok(ToolReply::message(
                    "Document delete conflict - revision mismatch",
                ));
            }
            other => {
                other?;
            }
        }

        info!(database = %input.database, id = %input.doc_id, "Deleted document");

        Ok(ToolReply::message(format!(
            "Document '{}' deleted successfully",
            input.doc_id
        )))
    }
}
