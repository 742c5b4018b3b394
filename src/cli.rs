//! One-shot commands run against the gateway instead of serving.

use crate::error::GatewayResult;
use crate::gateway::QueryGateway;
use crate::mcp::GatewayService;
use crate::tools::format::{format_as_table, format_schema_summary};
use clap::Subcommand;
use std::fmt::Write as _;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List the tools the MCP server exposes
    #[command(alias = "list")]
    Tools,
    /// Print a summary of the database schema
    Schema,
    /// Execute a SQL SELECT statement
    Sql {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },
    /// Ask a natural language question: generate SQL and run it
    Ask {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        question: Vec<String>,
    },
    /// Generate SQL for a question without executing it
    Generate {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        question: Vec<String>,
    },
}

/// Run `command` and return the text to print.
pub async fn run(command: &Command, gateway: Arc<QueryGateway>) -> GatewayResult<String> {
    let mut out = String::new();
    match command {
        Command::Tools => {
            let service = GatewayService::new(gateway);
            out.push_str("Available MCP Tools:\n");
            for tool in service.tools() {
                let description = tool.description.as_deref().unwrap_or("");
                let first_line = description.lines().next().unwrap_or("");
                let _ = writeln!(out, "  - {}: {}", tool.name, first_line);
            }
        }
        Command::Schema => {
            let schema = gateway.get_schema().await?;
            out.push_str("Database Schema:\n");
            out.push_str(&format_schema_summary(&schema));
        }
        Command::Sql { query } => {
            let result = gateway.execute_sql(&query.join(" ")).await?;
            out.push_str(&format_as_table(&result));
        }
        Command::Ask { question } => {
            let answer = gateway.ask(&question.join(" ")).await?;
            let _ = writeln!(out, "Generated SQL: {}\n", answer.sql);
            out.push_str(&format_as_table(&answer.result));
        }
        Command::Generate { question } => {
            let sql = gateway.generate_sql(&question.join(" ")).await?;
            out.push_str(&sql);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use clap::Parser;

    #[test]
    fn test_parse_sql_joins_words() {
        let config = Config::try_parse_from(["nl2sql-mcp-server", "sql", "SELECT", "*", "FROM", "t"])
            .unwrap();
        match config.command {
            Some(Command::Sql { query }) => assert_eq!(query.join(" "), "SELECT * FROM t"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_list_is_alias_for_tools() {
        let config = Config::try_parse_from(["nl2sql-mcp-server", "list"]).unwrap();
        assert_eq!(config.command, Some(Command::Tools));
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Config::try_parse_from(["nl2sql-mcp-server", "ask"]).is_err());
    }

    #[test]
    fn test_no_command_serves() {
        let config = Config::try_parse_from(["nl2sql-mcp-server"]).unwrap();
        assert!(config.command.is_none());
    }
}
