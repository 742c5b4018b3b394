//! Stdio transport: MCP JSON-RPC over standard input/output.

use crate::gateway::QueryGateway;
use crate::mcp::GatewayService;
use crate::transport::{Transport, TransportError, TransportResult, wait_for_signal};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tracing::{info, warn};

/// Reads JSON-RPC messages from stdin and writes responses to stdout.
pub struct StdioTransport {
    gateway: Arc<QueryGateway>,
}

impl StdioTransport {
    pub fn new(gateway: Arc<QueryGateway>) -> Self {
        Self { gateway }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> TransportResult<()> {
        info!(db_type = %self.gateway.db_type(), "Starting MCP server with stdio transport");

        let service = GatewayService::new(Arc::clone(&self.gateway));
        let running_service = service
            .serve(stdio())
            .await
            .map_err(|e| TransportError::Serve {
                transport: self.name(),
                message: format!("failed to start: {}", e),
            })?;

        tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        Err(TransportError::Serve {
                            transport: self.name(),
                            message: e.to_string(),
                        })
                    }
                }
            }
            _ = wait_for_signal() => {
                // A pending stdin read cannot be cancelled from here.
                info!("Shutdown signal received, exiting process");
                std::process::exit(0);
            }
        }
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}
