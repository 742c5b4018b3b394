//! NL2SQL MCP Server - Main entry point.
//!
//! Serves the gateway over stdio or HTTP, or runs a single CLI command.

use nl2sql_mcp_server::config::{Config, TransportMode};
use nl2sql_mcp_server::db::{Database, SqlxDatabase};
use nl2sql_mcp_server::gateway::QueryGateway;
use nl2sql_mcp_server::llm::{ChatCompletionModel, CompletionModel};
use nl2sql_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber. Logs go to stderr so stdout stays free
/// for the stdio protocol and command output.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    init_tracing(&config);

    let settings = config.connection_settings()?;
    info!(
        db_type = %settings.db_type,
        url = %settings.masked_url(),
        "Starting NL2SQL MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let database: Arc<dyn Database> = Arc::new(SqlxDatabase::new(settings));
    let model: Arc<dyn CompletionModel> = Arc::new(ChatCompletionModel::new(config.model_settings()));
    info!(model = %model.name(), "Model backend configured");
    let gateway = Arc::new(QueryGateway::new(database, model, config.execution_limits()));

    if let Some(command) = &config.command {
        return match nl2sql_mcp_server::cli::run(command, gateway).await {
            Ok(output) => {
                println!("{}", output);
                Ok(())
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                if let Some(suggestion) = e.suggestion() {
                    eprintln!("Hint: {}", suggestion);
                }
                std::process::exit(1);
            }
        };
    }

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            StdioTransport::new(gateway).run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            HttpTransport::new(
                gateway,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            )
            .run()
            .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
