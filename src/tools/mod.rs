//! Helpers shared by the tool surfaces.
//!
//! - `sql_validator`: the read-only gate applied before any execution
//! - `format`: plain-text rendering of results and schemas for the CLI

pub mod format;
pub mod sql_validator;
