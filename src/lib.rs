//! NL2SQL MCP Server Library
//!
//! Turns natural-language questions into read-only SQL with a language model,
//! runs the SQL against MySQL, PostgreSQL or SQLite, and returns typed JSON
//! results. The same four operations are served over a REST API and as MCP
//! tools.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod llm;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::{GatewayError, GatewayResult};
pub use gateway::QueryGateway;
pub use mcp::GatewayService;
