//! Lazily-established connection to the CouchDB server.
//!
//! The process holds exactly one handle to the configured server. It is
//! established on first use (or by an explicit early call at startup), cached
//! for the process lifetime, and never re-validated: a handle obtained once is
//! assumed good, and transient failures surface at the next actual operation.

use crate::couch::CouchClient;
use crate::error::{CouchError, CouchResult};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

pub struct ConnectionHolder {
    url: url::Url,
    client: OnceCell<Arc<CouchClient>>,
}

impl ConnectionHolder {
    /// Create an unconnected holder for the given server URL.
    pub fn new(url: url::Url) -> Self {
        Self {
            url,
            client: OnceCell::new(),
        }
    }

    /// The configured server URL.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Whether a handle has been established yet.
    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    /// Return the existing handle, or establish one.
    ///
    /// Establishing performs a liveness check (`GET /`, which returns the
    /// server version); any failure becomes a connection error carrying the
    /// configured URL and the underlying cause, and the holder stays
    /// unconnected so the next call retries.
    pub async fn ensure_connected(&self) -> CouchResult<Arc<CouchClient>> {
        self.client
            .get_or_try_init(|| async {
                let client = CouchClient::new(self.url.clone())?;
                let welcome = client
                    .version()
                    .await
                    .map_err(|e| CouchError::connection(self.url.as_str(), e.to_string()))?;
                info!(url = %self.url, version = %welcome.version, "Connected to CouchDB");
                Ok(Arc::new(client))
            })
            .await
            .cloned()
    }
}
