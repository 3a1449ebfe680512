//! MCP tool implementations.
//!
//! This module contains all CouchDB tool handlers:
//! - `database`: list, create, and delete databases
//! - `document`: document CRUD with MVCC revisions
//! - `search`: Mango selector queries and document enumeration
//! - `index`: secondary index management

pub mod database;
pub mod document;
pub mod index;
pub mod search;

pub use database::{CreateDatabaseInput, DatabaseToolHandler, DeleteDatabaseInput};
pub use document::{
    CreateDocumentInput, DeleteDocumentInput, DocumentToolHandler, GetDocumentInput,
    UpdateDocumentInput,
};
pub use index::{CreateIndexInput, IndexToolHandler, ListIndexesInput};
pub use search::{ListDocumentsInput, SearchDocumentsInput, SearchToolHandler};

use crate::error::{CouchError, CouchResult};
use serde::Serialize;

/// What a tool hands back to the MCP layer: a structured payload rendered as
/// pretty-printed JSON text, or a plain status message. Either way the caller
/// receives a single text content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolReply {
    Json(String),
    Message(String),
}

impl ToolReply {
    /// Render a structured payload as JSON text.
    pub fn json<T: Serialize>(value: &T) -> CouchResult<Self> {
        let text = serde_json::to_string_pretty(value)
            .map_err(|e| CouchError::internal(format!("failed to serialize response: {e}")))?;
        Ok(Self::Json(text))
    }

    /// Wrap a plain status message.
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    /// The text to put in the content block.
    pub fn into_text(self) -> String {
        match self {
            Self::Json(text) | Self::Message(text) => text,
        }
    }
}
