//! MCP server integration module.
//!
//! Bridges the MCP tool protocol to [`crate::gateway::QueryGateway`] using
//! the rmcp framework.

pub mod service;

pub use service::{GatewayService, QuestionInput, SqlInput};
