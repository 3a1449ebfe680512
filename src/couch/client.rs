//! HTTP client for the CouchDB REST API.
//!
//! `CouchClient` is a thin typed wrapper: one method per REST operation, with
//! CouchDB's status-code conventions translated into the [`CouchError`]
//! taxonomy in a single place. No retries, no caching - every call is one
//! HTTP round trip.

use crate::couch::types::{
    AllDocsResponse, CreateIndexRequest, CreateIndexResponse, ErrorBody, FindRequest,
    FindResponse, ListIndexesResponse, ServerWelcome, WriteAck,
};
use crate::error::{CouchError, CouchResult};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use url::Url;

/// What a 404 means for the request at hand: a missing database, or a missing
/// document within a database (CouchDB reports both on the same endpoint,
/// distinguished only by the error reason).
#[derive(Debug, Clone, Copy)]
enum NotFoundScope<'a> {
    Database(&'a str),
    Document { database: &'a str, id: &'a str },
}

#[derive(Debug)]
pub struct CouchClient {
    http: reqwest::Client,
    base: Url,
}

impl CouchClient {
    /// Create a client for the given server base URL. Timeouts are whatever
    /// reqwest defaults to; this layer configures none of its own.
    pub fn new(base: Url) -> CouchResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, base })
    }

    /// The server base URL this client points at.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build a URL for the given path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> CouchResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| CouchError::internal("CouchDB URL cannot be a base"))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// `GET /` - server liveness and version.
    pub async fn version(&self) -> CouchResult<ServerWelcome> {
        let resp = self.http.get(self.base.clone()).send().await?;
        self.decode(resp, NotFoundScope::Database("/")).await
    }

    /// `GET /_all_dbs` - names of all databases on the server.
    pub async fn all_dbs(&self) -> CouchResult<Vec<String>> {
        let url = self.endpoint(&["_all_dbs"])?;
        let resp = self.http.get(url).send().await?;
        self.decode(resp, NotFoundScope::Database("/_all_dbs")).await
    }

    /// `PUT /{db}` - create a database. 412 means it already exists.
    pub async fn create_db(&self, name: &str) -> CouchResult<()> {
        let url = self.endpoint(&[name])?;
        let resp = self.http.put(url).send().await?;
        if resp.status().is_success() {
            return Ok(());
        }
        if resp.status() == StatusCode::PRECONDITION_FAILED {
            return Err(CouchError::already_exists(name));
        }
        Err(self.failure(resp, NotFoundScope::Database(name)).await)
    }

    /// `DELETE /{db}` - delete a database.
    pub async fn delete_db(&self, name: &str) -> CouchResult<()> {
        let url = self.endpoint(&[name])?;
        let resp = self.http.delete(url).send().await?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(self.failure(resp, NotFoundScope::Database(name)).await)
    }

    /// `POST /{db}` - store a document, letting the server mint its id.
    pub async fn insert_doc(&self, database: &str, doc: &Value) -> CouchResult<WriteAck> {
        let url = self.endpoint(&[database])?;
        let resp = self.http.post(url).json(doc).send().await?;
        self.decode(resp, NotFoundScope::Database(database)).await
    }

    /// `PUT /{db}/{docid}` - store or update a document under a known id.
    /// Updating an existing document requires a matching `_rev` in the body;
    /// a stale or missing revision comes back as a 409 conflict.
    pub async fn put_doc(&self, database: &str, id: &str, doc: &Value) -> CouchResult<WriteAck> {
        let url = self.endpoint(&[database, id])?;
        let resp = self.http.put(url).json(doc).send().await?;
        self.decode(resp, NotFoundScope::Document { database, id })
            .await
    }

    /// `GET /{db}/{docid}` - fetch a document by id.
    pub async fn get_doc(&self, database: &str, id: &str) -> CouchResult<Value> {
        let url = self.endpoint(&[database, id])?;
        let resp = self.http.get(url).send().await?;
        self.decode(resp, NotFoundScope::Document { database, id })
            .await
    }

    /// `DELETE /{db}/{docid}?rev=...` - delete a specific revision.
    pub async fn delete_doc(&self, database: &str, id: &str, rev: &str) -> CouchResult<WriteAck> {
        let mut url = self.endpoint(&[database, id])?;
        url.query_pairs_mut().append_pair("rev", rev);
        let resp = self.http.delete(url).send().await?;
        self.decode(resp, NotFoundScope::Document { database, id })
            .await
    }

    /// `POST /{db}/_find` - run a Mango query, decoding the typed response.
    ///
    /// A 2xx body that doesn't match the expected shape signals a server
    /// whose `_find` implementation this client doesn't understand; that is
    /// surfaced as [`CouchError::Unsupported`] so the caller can fall back to
    /// the raw query path.
    pub async fn find(&self, database: &str, req: &FindRequest) -> CouchResult<FindResponse> {
        let url = self.endpoint(&[database, "_find"])?;
        let resp = self.http.post(url).json(req).send().await?;
        if !resp.status().is_success() {
            return Err(self.failure(resp, NotFoundScope::Database(database)).await);
        }
        let body: Value = resp.json().await?;
        serde_json::from_value(body).map_err(|_| CouchError::unsupported("_find"))
    }

    /// `POST /{db}/_find` - the raw fallback path. Issues the same query and
    /// hands back the response body as loose JSON, leaving interpretation
    /// (docs, warning) to the caller.
    pub async fn find_raw(&self, database: &str, req: &FindRequest) -> CouchResult<Value> {
        let url = self.endpoint(&[database, "_find"])?;
        let resp = self.http.post(url).json(req).send().await?;
        self.decode(resp, NotFoundScope::Database(database)).await
    }

    /// `GET /{db}/_all_docs` - enumerate documents, optionally with bodies.
    pub async fn all_docs(
        &self,
        database: &str,
        limit: Option<u64>,
        include_docs: bool,
    ) -> CouchResult<AllDocsResponse> {
        let mut url = self.endpoint(&[database, "_all_docs"])?;
        {
            let mut query = url.query_pairs_mut();
            if include_docs {
                query.append_pair("include_docs", "true");
            }
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        let resp = self.http.get(url).send().await?;
        self.decode(resp, NotFoundScope::Database(database)).await
    }

    /// `POST /{db}/_index` - create a JSON-type index. Re-creating an
    /// equivalent index succeeds with `result: "exists"`.
    pub async fn create_index(
        &self,
        database: &str,
        req: &CreateIndexRequest,
    ) -> CouchResult<CreateIndexResponse> {
        let url = self.endpoint(&[database, "_index"])?;
        let resp = self.http.post(url).json(req).send().await?;
        self.decode(resp, NotFoundScope::Database(database)).await
    }

    /// `GET /{db}/_index` - list all indexes on a database.
    pub async fn list_indexes(&self, database: &str) -> CouchResult<ListIndexesResponse> {
        let url = self.endpoint(&[database, "_index"])?;
        let resp = self.http.get(url).send().await?;
        self.decode(resp, NotFoundScope::Database(database)).await
    }

    /// Decode a successful response as JSON, or translate the failure.
    async fn decode<T: serde::de::DeserializeOwned>(
        &self,
        resp: Response,
        scope: NotFoundScope<'_>,
    ) -> CouchResult<T> {
        if resp.status().is_success() {
            return Ok(resp.json().await?);
        }
        Err(self.failure(resp, scope).await)
    }

    /// Translate a non-2xx response into the error taxonomy. The error body
    /// is consulted when present; an unreadable body still yields a usable
    /// error from the status code alone.
    async fn failure(&self, resp: Response, scope: NotFoundScope<'_>) -> CouchError {
        let status = resp.status();
        let body: Option<ErrorBody> = resp.json().await.ok();
        let detail = body
            .as_ref()
            .map(ErrorBody::describe)
            .unwrap_or_else(|| status.to_string());

        match status {
            StatusCode::NOT_FOUND => match scope {
                NotFoundScope::Database(name) => CouchError::database_not_found(name),
                NotFoundScope::Document { database, id } => {
                    // CouchDB reports a missing database on a document
                    // endpoint with reason "Database does not exist."
                    let reason = body.and_then(|b| b.reason).unwrap_or_default();
                    if reason.contains("Database does not exist") {
                        CouchError::database_not_found(database)
                    } else {
                        CouchError::document_not_found(id)
                    }
                }
            },
            StatusCode::CONFLICT => CouchError::conflict(detail),
            StatusCode::PRECONDITION_FAILED => match scope {
                NotFoundScope::Database(name) => CouchError::already_exists(name),
                NotFoundScope::Document { id, .. } => CouchError::conflict(format!(
                    "precondition failed for document '{id}': {detail}"
                )),
            },
            StatusCode::BAD_REQUEST => CouchError::invalid_input(detail),
            _ => CouchError::http(status.as_u16(), detail),
        }
    }
}
