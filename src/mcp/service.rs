//! MCP service implementation using rmcp.
//!
//! This module defines the CouchService struct with all CouchDB tools exposed
//! via the MCP protocol using the rmcp framework's macros. Every tool renders
//! its result as a text content block: structured payloads as pretty-printed
//! JSON, status updates and expected database conditions (not found, already
//! exists, revision conflict) as plain descriptive messages. Only genuine
//! failures - connectivity, malformed input, unexpected server responses -
//! surface as protocol errors, and none of them abort the serving loop.

use crate::couch::ConnectionHolder;
use crate::error::CouchResult;
use crate::tools::{
    CreateDatabaseInput, CreateDocumentInput, CreateIndexInput, DatabaseToolHandler,
    DeleteDatabaseInput, DeleteDocumentInput, DocumentToolHandler, GetDocumentInput,
    IndexToolHandler, ListDocumentsInput, ListIndexesInput, SearchDocumentsInput,
    SearchToolHandler, ToolReply, UpdateDocumentInput,
};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct CouchService {
    /// Shared connection holder for all CouchDB operations
    holder: Arc<ConnectionHolder>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl CouchService {
    /// Create a new CouchService instance.
    ///
    /// # Arguments
    ///
    /// * `holder` - Shared connection holder pointing at the configured server
    pub fn new(holder: Arc<ConnectionHolder>) -> Self {
        Self {
            holder,
            tool_router: Self::tool_router(),
        }
    }

    /// Map a handler result to a tool response at the dispatcher boundary.
    ///
    /// Friendly error categories become successful text blocks carrying the
    /// descriptive message; everything else becomes a protocol error.
    fn reply(result: CouchResult<ToolReply>) -> Result<CallToolResult, McpError> {
        match result {
            Ok(reply) => Ok(CallToolResult::success(vec![Content::text(
                reply.into_text(),
            )])),
            Err(e) if e.is_friendly() => {
                Ok(CallToolResult::success(vec![Content::text(e.to_string())]))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[tool_router]
impl CouchService {
    #[tool(description = "List all databases in the CouchDB server.")]
    async fn list_databases(&self) -> Result<CallToolResult, McpError> {
        let handler = DatabaseToolHandler::new(self.holder.clone());
        Self::reply(handler.list().await)
    }

    #[tool(description = "Create a new database.")]
    async fn create_database(
        &self,
        Parameters(input): Parameters<CreateDatabaseInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = DatabaseToolHandler::new(self.holder.clone());
        Self::reply(handler.create(input).await)
    }

    #[tool(description = "Delete a database.")]
    async fn delete_database(
        &self,
        Parameters(input): Parameters<DeleteDatabaseInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = DatabaseToolHandler::new(self.holder.clone());
        Self::reply(handler.delete(input).await)
    }

    #[tool(
        description = "Create a new document in a database.\nIf doc_id is omitted, CouchDB generates one."
    )]
    async fn create_document(
        &self,
        Parameters(input): Parameters<CreateDocumentInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = DocumentToolHandler::new(self.holder.clone());
        Self::reply(handler.create(input).await)
    }

    #[tool(description = "Retrieve a document from a database by its ID.")]
    async fn get_document(
        &self,
        Parameters(input): Parameters<GetDocumentInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = DocumentToolHandler::new(self.holder.clone());
        Self::reply(handler.get(input).await)
    }

    #[tool(
        description = "Update an existing document in a database.\nThe document must include the current _rev; a stale revision is reported as a conflict."
    )]
    async fn update_document(
        &self,
        Parameters(input): Parameters<UpdateDocumentInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = DocumentToolHandler::new(self.holder.clone());
        Self::reply(handler.update(input).await)
    }

    #[tool(description = "Delete a document from a database. Requires the current revision (_rev).")]
    async fn delete_document(
        &self,
        Parameters(input): Parameters<DeleteDocumentInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = DocumentToolHandler::new(self.holder.clone());
        Self::reply(handler.delete(input).await)
    }

    #[tool(
        description = "Search for documents in a database using a Mango query.\nWorks without indexes, but creating indexes (via create_index) improves performance significantly."
    )]
    async fn search_documents(
        &self,
        Parameters(input): Parameters<SearchDocumentsInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SearchToolHandler::new(self.holder.clone());
        Self::reply(handler.search(input).await)
    }

    #[tool(
        description = "List all documents in a database with their IDs and revisions.\nSet include_docs to true to return full document bodies."
    )]
    async fn list_documents(
        &self,
        Parameters(input): Parameters<ListDocumentsInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SearchToolHandler::new(self.holder.clone());
        Self::reply(handler.list(input).await)
    }

    #[tool(
        description = "Create an index to improve Mango query performance.\nWhile optional, indexes dramatically speed up queries and ensure reliable results."
    )]
    async fn create_index(
        &self,
        Parameters(input): Parameters<CreateIndexInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = IndexToolHandler::new(self.holder.clone());
        Self::reply(handler.create(input).await)
    }

    #[tool(description = "List all indexes in a database.")]
    async fn list_indexes(
        &self,
        Parameters(input): Parameters<ListIndexesInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = IndexToolHandler::new(self.holder.clone());
        Self::reply(handler.list(input).await)
    }
}

#[tool_handler]
impl ServerHandler for CouchService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "couch-mcp-server".to_owned(),
                title: Some("CouchDB MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "CouchDB tools for managing databases, documents, and indexes.\n\
                \n\
                ## Workflow\n\
                1. Call `list_databases` to see what exists on the server\n\
                2. Documents are versioned: updates and deletes need the current `_rev`\n\
                   (fetch it with `get_document` first)\n\
                3. `search_documents` takes a Mango selector, e.g. {\"type\": \"user\"}\n\
                   or {\"age\": {\"$gt\": 18}}; create an index on the selected fields\n\
                   with `create_index` for reliable, fast results\n\
                \n\
                ## Revision conflicts\n\
                A conflict message means the document changed since you last read it.\n\
                Fetch the latest revision with `get_document` and retry with that `_rev`.\n\
                Conflicts are never resolved or retried automatically."
                    .to_string(),
            ),
        }
    }
}
