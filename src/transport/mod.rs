//! Transport adapters over [`crate::gateway::QueryGateway`].
//!
//! - Stdio: MCP over standard input/output for agent hosts
//! - HTTP: the REST API plus MCP streamable HTTP on one listener

pub mod http;
pub mod stdio;

pub use http::{HttpTransport, api_router};
pub use stdio::StdioTransport;

use std::future::Future;
use thiserror::Error;
use tokio::signal;
use tracing::{error, info};

/// Failures of the serving loop itself, as opposed to per-request errors.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{transport} transport error: {message}")]
    Serve {
        transport: &'static str,
        message: String,
    },
}

pub type TransportResult<T> = Result<T, TransportError>;

/// A way of serving the gateway operations to clients.
pub trait Transport: Send + Sync {
    /// Serve until the client disconnects or a shutdown signal arrives.
    fn run(&self) -> impl Future<Output = TransportResult<()>> + Send;

    /// Get the name of this transport for logging.
    fn name(&self) -> &'static str;
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
///
/// If a handler cannot be installed, that signal source never fires.
pub(crate) async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
