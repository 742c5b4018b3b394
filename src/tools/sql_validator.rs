//! Read-only gate applied to every statement before it reaches the database.
//!
//! The default policy is a prefix check: after trimming and upper-casing, the
//! statement must begin with `SELECT`. It is a syntactic gate, not a sandbox.
//! On its own it does not catch stacked statements (`SELECT 1; DROP TABLE x`),
//! writes nested in subqueries, or comment tricks. Two things narrow that gap:
//! - statements run as prepared statements, which MySQL and PostgreSQL refuse
//!   to execute when more than one statement is present
//! - strict mode additionally parses the statement with
//!   [sqlparser](https://docs.rs/sqlparser/) and requires exactly one query
//!
//! Use a database account with read-only grants for real isolation.

use crate::error::{GatewayError, GatewayResult};
use crate::models::DatabaseType;
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

mod error_messages {
    pub const NOT_SELECT: &str = "Only SELECT queries are allowed for security";
    pub const MULTIPLE: &str = "Only a single statement is allowed per call";
    pub const PARSE_ERROR: &str = "Failed to parse SQL statement";
}

/// Accepts `sql` only if it starts with `SELECT` (case and surrounding
/// whitespace ignored).
///
/// ```
/// use nl2sql_mcp_server::tools::sql_validator::check;
///
/// assert!(check("  select id from t ").is_ok());
/// assert!(check("DROP TABLE t").is_err());
/// ```
pub fn check(sql: &str) -> GatewayResult<()> {
    if sql.trim().to_uppercase().starts_with("SELECT") {
        Ok(())
    } else {
        Err(GatewayError::policy(format!(
            "{}; statement starts with '{}'",
            error_messages::NOT_SELECT,
            leading_keyword(sql)
        )))
    }
}

/// Prefix check plus an AST check: exactly one statement, and it is a query.
pub fn check_strict(sql: &str, db_type: DatabaseType) -> GatewayResult<()> {
    check(sql)?;

    let dialect = get_dialect(db_type);
    let statements = Parser::parse_sql(dialect.as_ref(), sql).map_err(|e| {
        GatewayError::policy(format!("{}: {}", error_messages::PARSE_ERROR, e))
    })?;

    match statements.as_slice() {
        [Statement::Query(_)] => Ok(()),
        [other] => Err(GatewayError::policy(format!(
            "{}; found {}",
            error_messages::NOT_SELECT,
            leading_keyword(&other.to_string())
        ))),
        [] => Err(GatewayError::policy(error_messages::NOT_SELECT)),
        many => Err(GatewayError::policy(format!(
            "{}; found {}",
            error_messages::MULTIPLE,
            many.len()
        ))),
    }
}

/// Get the appropriate SQL dialect for the given database type.
fn get_dialect(db_type: DatabaseType) -> Box<dyn Dialect> {
    match db_type {
        DatabaseType::PostgreSQL => Box::new(PostgreSqlDialect {}),
        DatabaseType::MySQL => Box::new(MySqlDialect {}),
        DatabaseType::SQLite => Box::new(SQLiteDialect {}),
    }
}

fn leading_keyword(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .take(32)
        .collect::<String>()
        .to_uppercase()
}
