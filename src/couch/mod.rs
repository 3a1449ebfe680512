//! CouchDB access layer.
//!
//! This module owns everything that touches the database server:
//! - Typed HTTP client over the CouchDB REST surface
//! - Lazily-established, process-lifetime connection holder
//! - Wire types for requests and responses

pub mod client;
pub mod holder;
pub mod types;

pub use client::CouchClient;
pub use holder::ConnectionHolder;
pub use types::{
    AllDocsResponse, AllDocsRow, CreateIndexRequest, CreateIndexResponse, ErrorBody, FindRequest,
    FindResponse, ListIndexesResponse, ServerWelcome, WriteAck,
};
