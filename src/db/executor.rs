//! Statement execution.
//!
//! Every statement passes the read-only gate first, then runs on a fresh
//! connection with a timeout and a row bound. The whole result is
//! materialized in memory; there is no streaming or pagination.

use crate::config::{DEFAULT_MAX_RESULT_ROWS, DEFAULT_QUERY_TIMEOUT_SECS};
use crate::db::connection::{Database, RowSet};
use crate::db::normalize::normalize_row;
use crate::error::{GatewayError, GatewayResult};
use crate::models::QueryResult;
use crate::tools::sql_validator;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Bounds applied to every executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub query_timeout: Duration,
    /// More rows than this is an error, never a silent truncation
    pub max_rows: usize,
    /// Also require the statement to parse as exactly one query
    pub strict_sql: bool,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            max_rows: DEFAULT_MAX_RESULT_ROWS,
            strict_sql: false,
        }
    }
}

/// Runs vetted statements and normalizes their rows.
#[derive(Clone)]
pub struct SqlExecutor {
    database: Arc<dyn Database>,
    limits: ExecutionLimits,
}

impl SqlExecutor {
    pub fn new(database: Arc<dyn Database>, limits: ExecutionLimits) -> Self {
        Self { database, limits }
    }

    /// Execute `sql` and return columns, normalized rows and row count.
    ///
    /// A rejected statement never reaches the database.
    pub async fn execute(&self, sql: &str) -> GatewayResult<QueryResult> {
        let gate = if self.limits.strict_sql {
            sql_validator::check_strict(sql, self.database.db_type())
        } else {
            sql_validator::check(sql)
        };
        if let Err(e) = gate {
            warn!(error = %e, "Statement rejected");
            return Err(e);
        }

        let start = Instant::now();
        debug!(sql = %sql, timeout_secs = self.limits.query_timeout.as_secs(), "Executing statement");

        let mut conn = self.database.connect().await?;
        let fetched =
            tokio::time::timeout(self.limits.query_timeout, conn.fetch(sql, self.limits.max_rows))
                .await;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close connection after execution");
        }

        let set = match fetched {
            Ok(result) => result?,
            Err(_) => {
                return Err(GatewayError::execution(
                    format!(
                        "Statement exceeded the {}s timeout",
                        self.limits.query_timeout.as_secs()
                    ),
                    None,
                ));
            }
        };

        let result = self.build_result(set)?;
        info!(
            row_count = result.row_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Statement executed"
        );
        Ok(result)
    }

    fn build_result(&self, set: RowSet) -> GatewayResult<QueryResult> {
        if set.rows.len() > self.limits.max_rows {
            return Err(GatewayError::execution(
                format!(
                    "Result has more than {} rows; add a LIMIT or narrow the query",
                    self.limits.max_rows
                ),
                None,
            ));
        }

        let columns = unique_column_names(set.columns);
        let rows = set
            .rows
            .into_iter()
            .map(|values| normalize_row(&columns, values))
            .collect::<GatewayResult<Vec<_>>>()?;
        Ok(QueryResult::new(columns, rows))
    }
}

/// Repeated names (`SELECT a.id, b.id`) get `_2`, `_3`... so every column
/// keeps its own key in the row mapping.
fn unique_column_names(columns: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(columns.len());
    columns
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let mut n = 2;
            loop {
                let candidate = format!("{}_{}", name, n);
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = ExecutionLimits::default();
        assert_eq!(limits.query_timeout, Duration::from_secs(30));
        assert_eq!(limits.max_rows, 10_000);
        assert!(!limits.strict_sql);
    }

    #[test]
    fn test_unique_column_names() {
        let names = unique_column_names(vec![
            "id".to_string(),
            "id".to_string(),
            "name".to_string(),
            "id".to_string(),
        ]);
        assert_eq!(names, vec!["id", "id_2", "name", "id_3"]);
    }

    #[test]
    fn test_unique_column_names_avoids_existing_suffix() {
        let names = unique_column_names(vec![
            "id".to_string(),
            "id_2".to_string(),
            "id".to_string(),
        ]);
        assert_eq!(names, vec!["id", "id_2", "id_3"]);
    }
}
