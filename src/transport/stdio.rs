//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.

use crate::couch::ConnectionHolder;
use crate::error::{CouchError, CouchResult};
use crate::mcp::CouchService;
use crate::transport::Transport;
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes
/// responses to stdout, following the MCP protocol specification.
pub struct StdioTransport {
    holder: Arc<ConnectionHolder>,
}

impl StdioTransport {
    /// Create a new stdio transport with the given connection holder.
    pub fn new(holder: Arc<ConnectionHolder>) -> Self {
        Self { holder }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> CouchResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = CouchService::new(self.holder.clone());

        // Create the stdio transport and run the service
        let transport = stdio();
        let running_service = service.serve(transport).await.map_err(|e| {
            CouchError::internal(format!("Failed to start stdio transport: {}", e))
        })?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Stdio transport error");
                        return Err(CouchError::internal(format!(
                            "Stdio transport error: {}",
                            e
                        )));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        // The connection handle needs no teardown; process exit reclaims it.
        if shutdown_requested {
            // tokio::select! cannot interrupt blocking stdin reads, so the
            // process must exit explicitly
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}
