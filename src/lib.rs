//! CouchDB MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to manage CouchDB databases, documents, and indexes over the database's
//! REST API.

pub mod config;
pub mod couch;
pub mod error;
pub mod mcp;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::CouchError;
pub use mcp::CouchService;
