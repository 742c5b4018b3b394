//! Data models for the NL-to-SQL gateway.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;
pub mod query;
pub mod schema;

// Re-export commonly used types
pub use connection::{ConnectionSettings, DatabaseType};
pub use query::{
    AskResult, ExecuteSqlOutput, GenerateSqlOutput, QueryDatabaseOutput, QueryResult, Row,
    SchemaOutput,
};
pub use schema::{ColumnDescriptor, DatabaseSchema, SAMPLE_ROW_LIMIT, TableSchema};
