//! Schema introspection: tables, declared columns and a few sample rows.

use crate::db::connection::{Connection, Database};
use crate::db::normalize::normalize_row;
use crate::error::GatewayResult;
use crate::models::{DatabaseSchema, SAMPLE_ROW_LIMIT, TableSchema};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Builds a [`DatabaseSchema`] snapshot on demand. Nothing is cached.
#[derive(Clone)]
pub struct SchemaInspector {
    database: Arc<dyn Database>,
}

impl SchemaInspector {
    pub fn new(database: Arc<dyn Database>) -> Self {
        Self { database }
    }

    /// Inspect every table. Any per-table failure aborts the whole inspection.
    pub async fn inspect(&self) -> GatewayResult<DatabaseSchema> {
        let start = Instant::now();
        let mut conn = self.database.connect().await?;

        let outcome = inspect_with(conn.as_mut()).await;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close connection after schema inspection");
        }

        let schema = outcome?;
        info!(
            tables = schema.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Schema inspected"
        );
        Ok(schema)
    }
}

async fn inspect_with(conn: &mut dyn Connection) -> GatewayResult<DatabaseSchema> {
    let mut schema = DatabaseSchema::new();

    for table in conn.list_tables().await? {
        let columns = conn.describe_table(&table).await?;
        let sample = conn.sample_rows(&table, SAMPLE_ROW_LIMIT).await?;
        let sample_rows = sample
            .rows
            .into_iter()
            .take(SAMPLE_ROW_LIMIT)
            .map(|values| normalize_row(&sample.columns, values))
            .collect::<GatewayResult<Vec<_>>>()?;

        debug!(
            table = %table,
            columns = columns.len(),
            sample_rows = sample_rows.len(),
            "Inspected table"
        );
        schema.insert(table, TableSchema::new(columns, sample_rows));
    }

    Ok(schema)
}
