//! Natural-language question to SQL, grounded in the live schema.

use crate::error::{GatewayError, GatewayResult};
use crate::llm::model::CompletionModel;
use crate::models::{DatabaseSchema, DatabaseType};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds the grounding prompt, makes one model call, cleans the reply.
#[derive(Clone)]
pub struct NlToSqlTranslator {
    model: Arc<dyn CompletionModel>,
    dialect: DatabaseType,
}

impl NlToSqlTranslator {
    pub fn new(model: Arc<dyn CompletionModel>, dialect: DatabaseType) -> Self {
        Self { model, dialect }
    }

    /// Translate `question` into a single SQL statement.
    ///
    /// The result is not checked against the read-only gate here; execution
    /// applies the gate to every statement regardless of origin.
    pub async fn translate(&self, question: &str, schema: &DatabaseSchema) -> GatewayResult<String> {
        let prompt = build_prompt(question, schema, self.dialect);
        debug!(
            backend = self.model.name(),
            tables = schema.len(),
            prompt_chars = prompt.len(),
            "Requesting SQL generation"
        );

        let reply = self.model.complete(&prompt).await?;
        let sql = extract_sql(&reply)?;
        info!(sql = %sql, "SQL generated");
        Ok(sql)
    }
}

/// Plain-text schema rendering: every table, column, declared type and sample row.
pub fn describe_schema(schema: &DatabaseSchema) -> String {
    if schema.is_empty() {
        return "(no tables)\n".to_string();
    }

    let mut out = String::new();
    for (table, info) in schema {
        let _ = writeln!(out, "Table: {}", table);
        let _ = writeln!(out, "Columns:");
        for column in &info.columns {
            let _ = writeln!(out, "  - {} ({})", column.name, column.declared_type);
        }
        if info.sample_rows.is_empty() {
            let _ = writeln!(out, "Sample rows: none");
        } else {
            let _ = writeln!(out, "Sample rows:");
            for row in &info.sample_rows {
                let rendered = serde_json::to_string(row).unwrap_or_default();
                let _ = writeln!(out, "  {}", rendered);
            }
        }
        out.push('\n');
    }
    out
}

pub fn build_prompt(question: &str, schema: &DatabaseSchema, dialect: DatabaseType) -> String {
    format!(
        "You are an expert SQL query generator for {dialect} databases.\n\n\
         Question: {question}\n\n\
         Database Schema:\n{schema}\n\
         Instructions:\n\
         1. Generate exactly one valid {dialect} SELECT query\n\
         2. Use only table and column names that appear in the schema\n\
         3. Include appropriate WHERE clauses, JOINs, and aggregations as needed\n\
         4. Return ONLY the SQL query, with no explanations and no markdown code fences\n\
         5. The query must be read-only\n\n\
         SQL Query:",
        question = question.trim(),
        schema = describe_schema(schema),
        dialect = dialect.display_name(),
    )
}

/// Fence tags that mark a block as SQL rather than starting the statement.
const LANGUAGE_TAGS: &[&str] = &["sql", "mysql", "postgresql", "postgres", "sqlite", "pgsql"];

/// Strip code fences (with or without a language tag) and surrounding whitespace.
///
/// Only the fence marker and its tag are removed; text that follows them on
/// the opening line is kept.
pub fn extract_sql(reply: &str) -> GatewayResult<String> {
    let mut text = reply.trim();

    if let Some(rest) = text.strip_prefix("```") {
        let tag_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let tag = &rest[..tag_end];
        text = if LANGUAGE_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            &rest[tag_end..]
        } else {
            rest
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    let sql = text.trim();
    if sql.is_empty() {
        return Err(GatewayError::generation("Generated SQL query is empty"));
    }
    Ok(sql.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnDescriptor, Row, TableSchema};
    use serde_json::json;

    fn sample_schema() -> DatabaseSchema {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(1));
        row.insert("total".to_string(), json!(12.5));
        let mut schema = DatabaseSchema::new();
        schema.insert(
            "orders".to_string(),
            TableSchema::new(
                vec![
                    ColumnDescriptor::new("id", "int"),
                    ColumnDescriptor::new("total", "decimal(10,2)"),
                ],
                vec![row],
            ),
        );
        schema.insert(
            "empty_table".to_string(),
            TableSchema::new(vec![ColumnDescriptor::new("x", "text")], vec![]),
        );
        schema
    }

    #[test]
    fn test_extract_plain_sql() {
        assert_eq!(extract_sql("  SELECT 1  \n").unwrap(), "SELECT 1");
    }

    #[test]
    fn test_extract_fenced_sql_with_tag() {
        assert_eq!(
            extract_sql("```sql\nSELECT * FROM t\n```").unwrap(),
            "SELECT * FROM t"
        );
    }

    #[test]
    fn test_extract_fenced_sql_without_tag() {
        assert_eq!(
            extract_sql("```\nSELECT id FROM t\nWHERE x = 1\n```").unwrap(),
            "SELECT id FROM t\nWHERE x = 1"
        );
    }

    #[test]
    fn test_extract_single_line_fence() {
        assert_eq!(extract_sql("```sql SELECT 1```").unwrap(), "SELECT 1");
        assert_eq!(extract_sql("```SELECT 2```").unwrap(), "SELECT 2");
    }

    #[test]
    fn test_extract_keeps_sql_on_opening_fence_line() {
        assert_eq!(
            extract_sql("```SELECT *\nFROM t\n```").unwrap(),
            "SELECT *\nFROM t"
        );
        assert_eq!(
            extract_sql("```sql SELECT id\nFROM t\n```").unwrap(),
            "SELECT id\nFROM t"
        );
    }

    #[test]
    fn test_extract_other_sql_tags() {
        assert_eq!(
            extract_sql("```PostgreSQL\nSELECT 1\n```").unwrap(),
            "SELECT 1"
        );
    }

    #[test]
    fn test_extract_empty_is_generation_error() {
        for reply in ["", "   ", "```sql\n```", "```\n\n```"] {
            let err = extract_sql(reply).unwrap_err();
            assert!(matches!(err, GatewayError::Generation { .. }), "{:?}", reply);
        }
    }

    #[test]
    fn test_describe_schema_covers_everything() {
        let text = describe_schema(&sample_schema());
        assert!(text.contains("Table: orders"));
        assert!(text.contains("  - id (int)"));
        assert!(text.contains("  - total (decimal(10,2))"));
        assert!(text.contains(r#"{"id":1,"total":12.5}"#));
        assert!(text.contains("Table: empty_table"));
        assert!(text.contains("Sample rows: none"));
    }

    #[test]
    fn test_prompt_contains_question_and_directives() {
        let prompt = build_prompt("  How many orders?  ", &sample_schema(), DatabaseType::MySQL);
        assert!(prompt.contains("Question: How many orders?\n"));
        assert!(prompt.contains("Table: orders"));
        assert!(prompt.starts_with("You are an expert SQL query generator for MySQL databases."));
        assert!(prompt.contains("exactly one valid MySQL SELECT"));
        assert!(prompt.contains("no markdown code fences"));
        assert!(prompt.contains("read-only"));
        assert!(prompt.ends_with("SQL Query:"));
    }

    #[test]
    fn test_prompt_for_empty_schema() {
        let prompt = build_prompt("anything", &DatabaseSchema::new(), DatabaseType::SQLite);
        assert!(prompt.contains("(no tables)"));
        assert!(prompt.contains("for SQLite databases"));
    }
}
