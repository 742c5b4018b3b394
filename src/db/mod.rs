//! Database abstraction layer.
//!
//! - `connection`: the database collaborator seam and its sqlx backends
//! - `types`: per-driver column decoding
//! - `normalize`: native values to transport-safe JSON
//! - `schema`: schema snapshots for prompt grounding
//! - `executor`: gated statement execution

pub mod connection;
pub mod executor;
pub mod normalize;
pub mod schema;
pub mod types;

pub use connection::{Connection, Database, RowSet, SqlxDatabase};
pub use executor::{ExecutionLimits, SqlExecutor};
pub use normalize::{NativeValue, normalize, normalize_row};
pub use schema::SchemaInspector;
