//! Secondary index tools.
//!
//! This module implements the `create_index` and `list_indexes` MCP tools.
//! Index creation is idempotent from the caller's perspective: CouchDB answers
//! an equivalent re-creation with `result: "exists"`, which is reported
//! verbatim rather than treated as an error.

use crate::couch::types::CreateIndexRequest;
use crate::couch::ConnectionHolder;
use crate::error::{CouchError, CouchResult};
use crate::tools::ToolReply;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Input for the create_index tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateIndexInput {
    /// Name of the database
    pub database: String,
    /// Fields to index, in order (e.g. ["type", "name"])
    pub fields: Vec<String>,
    /// Optional name for the index
    #[serde(default)]
    pub index_name: Option<String>,
}

/// Input for the list_indexes tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListIndexesInput {
    /// Name of the database
    pub database: String,
}

/// Output for the create_index tool.
#[derive(Debug, Clone, Serialize)]
pub struct CreateIndexOutput {
    /// "created", or "exists" when an equivalent index was already present
    pub result: String,
    pub id: String,
    pub name: String,
    pub message: String,
}

/// Output for the list_indexes tool.
#[derive(Debug, Clone, Serialize)]
pub struct ListIndexesOutput {
    pub indexes: Vec<Value>,
    pub count: usize,
    pub total_rows: u64,
}

pub struct IndexToolHandler {
    holder: Arc<ConnectionHolder>,
}

impl IndexToolHandler {
    pub fn new(holder: Arc<ConnectionHolder>) -> Self {
        Self { holder }
    }

    pub async fn create(&self, input: CreateIndexInput) -> CouchResult<ToolReply> {
        if input.fields.is_empty() {
            return Err(CouchError::invalid_input(
                "an index needs at least one field",
            ));
        }

        let client = self.holder.ensure_connected().await?;

        let request = CreateIndexRequest::json(input.fields.clone(), input.index_name);
        let resp = client.create_index(&input.database, &request).await?;

        info!(
            database = %input.database,
            index = %resp.name,
            result = %resp.result,
            "Created index"
        );

        ToolReply::json(&CreateIndexOutput {
            result: resp.result,
            id: resp.id,
            name: resp.name,
            message: format!("Index created successfully on fields: {:?}", input.fields),
        })
    }

    pub async fn list(&self, input: ListIndexesInput) -> CouchResult<ToolReply> {
        let client = self.holder.ensure_connected().await?;

        let resp = client.list_indexes(&input.database).await?;
        let count = resp.indexes.len();

        info!(database = %input.database, count, "Listed indexes");

        ToolReply::json(&ListIndexesOutput {
            indexes: resp.indexes,
            count,
            total_rows: resp.total_rows,
        })
    }
}
