//! Schema-related data models.
//!
//! These types describe a database as the model sees it: tables, their
//! declared columns, and a handful of sample rows.

use crate::models::Row;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of sample rows captured per table.
pub const SAMPLE_ROW_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Type as declared in the database (e.g., "varchar(255)", "decimal(10,2)")
    pub declared_type: String,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableSchema {
    /// Columns in declaration order
    pub columns: Vec<ColumnDescriptor>,
    /// Up to three rows in the database's default order
    pub sample_rows: Vec<Row>,
}

impl TableSchema {
    /// Create a table schema from columns and sample rows.
    pub fn new(columns: Vec<ColumnDescriptor>, sample_rows: Vec<Row>) -> Self {
        Self {
            columns,
            sample_rows,
        }
    }
}

/// Table name to table schema. Rebuilt on every request.
pub type DatabaseSchema = BTreeMap<String, TableSchema>;
