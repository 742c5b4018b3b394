//! Query-related data models.
//!
//! This module defines the result of running a statement and the payloads
//! both transport adapters return for each gateway operation.

use crate::models::DatabaseSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One result row: column name to transport-safe scalar, in result-set order.
pub type Row = serde_json::Map<String, JsonValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueryResult {
    /// Column names in result-set order
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Always equal to `rows.len()`
    pub row_count: usize,
}

impl QueryResult {
    /// Create a result; the row count is derived from `rows`.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// Create an empty result (statement produced no result set).
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Outcome of `Ask`: the generated statement and what it returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResult {
    pub sql: String,
    pub result: QueryResult,
}

// =============================================================================
// Operation payloads shared by the HTTP and tool-protocol adapters
// =============================================================================

/// Output of `get_schema`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SchemaOutput {
    /// Table name to columns and sample rows
    pub schema: DatabaseSchema,
}

/// Output of `generate_sql`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct GenerateSqlOutput {
    pub question: String,
    pub generated_sql: String,
}

/// Output of `execute_sql`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ExecuteSqlOutput {
    pub sql_query: String,
    pub result: QueryResult,
}

/// Output of `query_database`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QueryDatabaseOutput {
    pub question: String,
    pub generated_sql: String,
    pub result: QueryResult,
}

impl QueryDatabaseOutput {
    /// Pair an answered question with its generated SQL and result.
    pub fn new(question: impl Into<String>, answer: AskResult) -> Self {
        Self {
            question: question.into(),
            generated_sql: answer.sql,
            result: answer.result,
        }
    }
}
