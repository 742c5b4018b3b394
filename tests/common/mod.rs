//! Stub collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use nl2sql_mcp_server::db::{Connection, Database, ExecutionLimits, NativeValue, RowSet};
use nl2sql_mcp_server::error::{GatewayError, GatewayResult};
use nl2sql_mcp_server::gateway::QueryGateway;
use nl2sql_mcp_server::llm::CompletionModel;
use nl2sql_mcp_server::models::{ColumnDescriptor, DatabaseType};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One in-memory table: declared columns and its rows.
#[derive(Debug, Clone, Default)]
pub struct StubTable {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<NativeValue>>,
}

impl StubTable {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Database whose tables live in memory. `fetch` answers with the table
/// named after the last `FROM` in the statement.
#[derive(Default)]
pub struct StubDatabase {
    pub tables: BTreeMap<String, StubTable>,
    pub connects: AtomicUsize,
    pub fetches: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    /// When set, `connect` fails with this connectivity message.
    pub unreachable: Option<String>,
    /// When set, `describe_table` fails for this table.
    pub broken_table: Option<String>,
}

impl StubDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, table: StubTable) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    pub fn unreachable(message: &str) -> Self {
        Self {
            unreachable: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_broken_table(mut self, name: &str) -> Self {
        self.broken_table = Some(name.to_string());
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Database for StubDatabase {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    async fn connect(&self) -> GatewayResult<Box<dyn Connection>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.unreachable {
            return Err(GatewayError::connectivity(message.clone(), "Start the database"));
        }
        Ok(Box::new(StubConnection {
            tables: self.tables.clone(),
            fetches: Arc::clone(&self.fetches),
            closes: Arc::clone(&self.closes),
            broken_table: self.broken_table.clone(),
        }))
    }
}

struct StubConnection {
    tables: BTreeMap<String, StubTable>,
    fetches: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    broken_table: Option<String>,
}

impl StubConnection {
    fn table(&self, name: &str) -> GatewayResult<&StubTable> {
        self.tables.get(name).ok_or_else(|| {
            GatewayError::execution(
                format!("Table '{}' doesn't exist", name),
                Some("42S02".to_string()),
            )
        })
    }
}

#[async_trait]
impl Connection for StubConnection {
    async fn list_tables(&mut self) -> GatewayResult<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn describe_table(&mut self, table: &str) -> GatewayResult<Vec<ColumnDescriptor>> {
        if self.broken_table.as_deref() == Some(table) {
            return Err(GatewayError::execution(
                format!("SHOW COLUMNS command denied for table '{}'", table),
                Some("42000".to_string()),
            ));
        }
        Ok(self.table(table)?.columns.clone())
    }

    async fn sample_rows(&mut self, table: &str, limit: usize) -> GatewayResult<RowSet> {
        let table = self.table(table)?;
        Ok(RowSet {
            columns: table.column_names(),
            rows: table.rows.iter().take(limit).cloned().collect(),
        })
    }

    async fn fetch(&mut self, sql: &str, max_rows: usize) -> GatewayResult<RowSet> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let upper = sql.to_uppercase();
        let name = upper
            .rfind("FROM ")
            .map(|i| sql[i + 5..].split_whitespace().next().unwrap_or(""))
            .unwrap_or("")
            .trim_end_matches(';');
        let table = self.table(name)?;
        Ok(RowSet {
            columns: table.column_names(),
            rows: table.rows.iter().take(max_rows + 1).cloned().collect(),
        })
    }

    async fn close(self: Box<Self>) -> GatewayResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Model that always replies with the same text.
pub struct StubModel {
    pub reply: String,
    pub calls: AtomicUsize,
    pub last_prompt: std::sync::Mutex<Option<String>>,
}

impl StubModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            last_prompt: std::sync::Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionModel for StubModel {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn complete(&self, prompt: &str) -> GatewayResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        Ok(self.reply.clone())
    }
}

/// Table `t` with columns `id` (int) and `name` (varchar) and two rows.
pub fn table_t() -> StubTable {
    StubTable {
        columns: vec![
            ColumnDescriptor::new("id", "int"),
            ColumnDescriptor::new("name", "varchar(50)"),
        ],
        rows: vec![
            vec![NativeValue::Int(1), NativeValue::Text("alice".to_string())],
            vec![NativeValue::Int(2), NativeValue::Text("bob".to_string())],
        ],
    }
}

pub fn gateway(database: Arc<StubDatabase>, model: Arc<StubModel>) -> QueryGateway {
    QueryGateway::new(database, model, ExecutionLimits::default())
}
