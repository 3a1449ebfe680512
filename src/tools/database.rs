//! Database management tools.
//!
//! This module implements the `list_databases`, `create_database`, and
//! `delete_database` MCP tools.

use crate::couch::ConnectionHolder;
use crate::error::{CouchError, CouchResult};
use crate::tools::ToolReply;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the create_database tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateDatabaseInput {
    /// Name of the database to create
    pub name: String,
}

/// Input for the delete_database tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteDatabaseInput {
    /// Name of the database to delete
    pub name: String,
}

/// Output for the list_databases tool.
#[derive(Debug, Clone, Serialize)]
pub struct ListDatabasesOutput {
    pub databases: Vec<String>,
    pub count: usize,
}

pub struct DatabaseToolHandler {
    holder: Arc<ConnectionHolder>,
}

impl DatabaseToolHandler {
    pub fn new(holder: Arc<ConnectionHolder>) -> Self {
        Self { holder }
    }

    /// Reject empty or whitespace-only database names before the wire call.
    fn validate_name(name: &str) -> CouchResult<&str> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CouchError::invalid_input("database name must not be empty"));
        }
        Ok(trimmed)
    }

    pub async fn list(&self) -> CouchResult<ToolReply> {
        let client = self.holder.ensure_connected().await?;
        let databases = client.all_dbs().await?;
        let count = databases.len();

        info!(count, "Listed databases");

        ToolReply::json(&ListDatabasesOutput { databases, count })
    }

    pub async fn create(&self, input: CreateDatabaseInput) -> CouchResult<ToolReply> {
        let name = Self::validate_name(&input.name)?;
        let client = self.holder.ensure_connected().await?;

        client.create_db(name).await?;

        info!(database = %name, "Created database");

        Ok(ToolReply::message(format!(
            "Database '{name}' created successfully"
        )))
    }

    pub async fn delete(&self, input: DeleteDatabaseInput) -> CouchResult<ToolReply> {
        let name = Self::validate_name(&input.name)?;
        let client = self.holder.ensure_connected().await?;

        client.delete_db(name).await?;

        info!(database = %name, "Deleted database");

        Ok(ToolReply::message(format!(
            "Database '{name}' deleted successfully"
        )))
    }
}
