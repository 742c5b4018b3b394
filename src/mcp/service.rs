//! MCP service implementation using rmcp.
//!
//! Exposes the four gateway operations as tools. Each tool returns the same
//! payload the HTTP adapter returns for the matching endpoint.

use crate::gateway::QueryGateway;
use crate::models::{ExecuteSqlOutput, GenerateSqlOutput, QueryDatabaseOutput, SchemaOutput};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo, Tool},
    schemars::JsonSchema,
    tool, tool_handler, tool_router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Input for tools that take a natural-language question.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct QuestionInput {
    /// Natural language question about the database
    #[serde(default)]
    pub question: String,
}

/// Input for the execute_sql tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SqlInput {
    /// SQL SELECT query to execute
    #[serde(default)]
    pub sql: String,
}

/// A required tool argument that is absent or blank.
fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, McpError> {
    if value.trim().is_empty() {
        return Err(McpError::invalid_params(
            format!("Missing '{}' field", field),
            None,
        ));
    }
    Ok(value)
}

#[derive(Clone)]
pub struct GatewayService {
    gateway: Arc<QueryGateway>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl GatewayService {
    pub fn new(gateway: Arc<QueryGateway>) -> Self {
        Self {
            gateway,
            tool_router: Self::tool_router(),
        }
    }

    /// Tool definitions (name, description, input schema).
    pub fn tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }
}

#[tool_router]
impl GatewayService {
    #[tool(
        description = "Answer a natural language question about the database: generates a SQL SELECT query from the live schema, runs it, and returns both the SQL and the rows."
    )]
    pub async fn query_database(
        &self,
        Parameters(input): Parameters<QuestionInput>,
    ) -> Result<Json<QueryDatabaseOutput>, McpError> {
        info!(tool = "query_database", "Tool called");
        let answer = self.gateway.ask(required("question", &input.question)?).await?;
        Ok(Json(QueryDatabaseOutput::new(input.question, answer)))
    }

    #[tool(
        description = "Execute a raw SQL SELECT query on the database.\nOnly statements starting with SELECT are accepted."
    )]
    pub async fn execute_sql(
        &self,
        Parameters(input): Parameters<SqlInput>,
    ) -> Result<Json<ExecuteSqlOutput>, McpError> {
        info!(tool = "execute_sql", "Tool called");
        let result = self.gateway.execute_sql(required("sql", &input.sql)?).await?;
        Ok(Json(ExecuteSqlOutput {
            sql_query: input.sql,
            result,
        }))
    }

    #[tool(
        description = "Get the database schema: every table with its columns, declared types and up to 3 sample rows."
    )]
    pub async fn get_schema(&self) -> Result<Json<SchemaOutput>, McpError> {
        info!(tool = "get_schema", "Tool called");
        let schema = self.gateway.get_schema().await?;
        Ok(Json(SchemaOutput { schema }))
    }

    #[tool(description = "Generate a SQL query from a natural language question without executing it.")]
    pub async fn generate_sql(
        &self,
        Parameters(input): Parameters<QuestionInput>,
    ) -> Result<Json<GenerateSqlOutput>, McpError> {
        info!(tool = "generate_sql", "Tool called");
        let generated_sql = self
            .gateway
            .generate_sql(required("question", &input.question)?)
            .await?;
        Ok(Json(GenerateSqlOutput {
            question: input.question,
            generated_sql,
        }))
    }
}

#[tool_handler]
impl ServerHandler for GatewayService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nl2sql-mcp-server".to_owned(),
                title: Some("NL2SQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Natural-language access to a {} database (read-only).\n\
                \n\
                ## Workflow\n\
                1. Call `get_schema` to see tables, columns and sample rows\n\
                2. Call `query_database` with a question to get SQL and results in one step\n\
                3. Or call `generate_sql` to review the SQL first, then `execute_sql` to run it\n\
                \n\
                ## Rules\n\
                - Only statements starting with SELECT are executed\n\
                - Results are capped; add LIMIT to large queries\n\
                - Dates are ISO-8601 strings, decimals are numbers",
                self.gateway.db_type()
            )),
        }
    }
}
