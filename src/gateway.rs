//! The four gateway operations shared by every transport.
//!
//! `QueryGateway` owns no state between calls: each operation opens its own
//! database connection(s) and rebuilds the schema when it needs one.

use crate::db::{Database, ExecutionLimits, SchemaInspector, SqlExecutor};
use crate::error::{GatewayError, GatewayResult};
use crate::llm::{CompletionModel, NlToSqlTranslator};
use crate::models::{AskResult, DatabaseSchema, DatabaseType, QueryResult};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct QueryGateway {
    database: Arc<dyn Database>,
    inspector: SchemaInspector,
    executor: SqlExecutor,
    translator: NlToSqlTranslator,
}

impl QueryGateway {
    pub fn new(
        database: Arc<dyn Database>,
        model: Arc<dyn CompletionModel>,
        limits: ExecutionLimits,
    ) -> Self {
        let dialect = database.db_type();
        Self {
            inspector: SchemaInspector::new(Arc::clone(&database)),
            executor: SqlExecutor::new(Arc::clone(&database), limits),
            translator: NlToSqlTranslator::new(model, dialect),
            database,
        }
    }

    pub fn db_type(&self) -> DatabaseType {
        self.database.db_type()
    }

    /// Fresh schema snapshot.
    #[instrument(skip(self))]
    pub async fn get_schema(&self) -> GatewayResult<DatabaseSchema> {
        self.inspector.inspect().await
    }

    /// Generate SQL for `question` without running it.
    #[instrument(skip(self))]
    pub async fn generate_sql(&self, question: &str) -> GatewayResult<String> {
        let question = require("question", question)?;
        let schema = self.inspector.inspect().await?;
        self.translator.translate(question, &schema).await
    }

    /// Execute caller-supplied SQL through the read-only gate.
    #[instrument(skip(self))]
    pub async fn execute_sql(&self, sql: &str) -> GatewayResult<QueryResult> {
        let sql = require("sql", sql)?;
        self.executor.execute(sql).await
    }

    /// Generate SQL for `question`, then execute it.
    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> GatewayResult<AskResult> {
        let sql = self.generate_sql(question).await?;
        let result = self.executor.execute(&sql).await?;
        info!(row_count = result.row_count, "Question answered");
        Ok(AskResult { sql, result })
    }

    /// Open and close one connection.
    pub async fn check_connection(&self) -> GatewayResult<()> {
        let conn = self.database.connect().await?;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close connection after connectivity check");
        }
        Ok(())
    }
}

/// Reject empty or whitespace-only required fields.
fn require<'a>(field: &str, value: &'a str) -> GatewayResult<&'a str> {
    if value.trim().is_empty() {
        return Err(GatewayError::input(format!("Missing '{}' field", field)));
    }
    Ok(value)
}
