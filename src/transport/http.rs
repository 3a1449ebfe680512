//! HTTP transport with Streamable HTTP support for the MCP server.
//!
//! This transport uses HTTP with SSE streaming responses,
//! which is suitable for web-based MCP integrations.

use crate::couch::ConnectionHolder;
use crate::error::{CouchError, CouchResult};
use crate::mcp::CouchService;
use crate::transport::Transport;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// HTTP transport implementation with Streamable HTTP support.
///
/// This transport provides:
/// - HTTP endpoints for MCP protocol messages
/// - Server-Sent Events for streaming responses
/// - Session management for stateful connections
pub struct HttpTransport {
    holder: Arc<ConnectionHolder>,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
    /// MCP endpoint path
    endpoint: String,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    ///
    /// * `holder` - Shared connection holder for CouchDB operations
    /// * `host` - Host address to bind to
    /// * `port` - Port to bind to
    /// * `endpoint` - MCP endpoint path (e.g. "/mcp")
    pub fn new(
        holder: Arc<ConnectionHolder>,
        host: impl Into<String>,
        port: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            holder,
            host: host.into(),
            port,
            endpoint: endpoint.into(),
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the MCP endpoint path.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> CouchResult<()> {
        let bind_addr = self.bind_addr();
        info!("Starting MCP server with HTTP transport on {}", bind_addr);

        // Clone the Arc for the service factory closure
        let holder = self.holder.clone();

        // Create the StreamableHttpService with a factory that creates
        // CouchService instances sharing the one connection holder
        let service = StreamableHttpService::new(
            move || Ok(CouchService::new(holder.clone())),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        // Build the axum router with configurable endpoint
        // Note: nest_service doesn't support root path "/", use fallback_service instead
        let app = if self.endpoint == "/" {
            axum::Router::new().fallback_service(service)
        } else {
            axum::Router::new().nest_service(&self.endpoint, service)
        };

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            CouchError::internal(format!(
                "Failed to bind to {}: {} (check that the port is available)",
                bind_addr, e
            ))
        })?;

        info!(endpoint = %self.endpoint, "MCP endpoint ready");

        // Graceful shutdown: SSE connections may keep the server alive
        // indefinitely, so exit is forced after a timeout once the shutdown
        // signal is received
        const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();

        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(CouchError::internal(format!(
                            "HTTP server error: {}",
                            e
                        )));
                    }
                }
            }
            _ = async {
                // Wait for shutdown signal, then wait for either timeout or second signal
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {
                // Timeout or second signal reached - server will be dropped
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
