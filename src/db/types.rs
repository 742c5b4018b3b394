//! Database-agnostic type mappings.
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Database-specific decoders extract a [`NativeValue`]
//!
//! A value that cannot be decoded is an execution error. Nothing is
//! silently replaced with NULL.

use crate::db::normalize::NativeValue;
use crate::error::{GatewayError, GatewayResult};
use crate::models::DatabaseType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Type, TypeInfo};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Uuid,
    Date,
    Time,
    DateTime,
    Timestamp,
    Array,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower.ends_with("[]") {
        return TypeCategory::Array;
    }

    // Names that would otherwise match the "int" rule below
    if lower == "interval" || lower.contains("point") {
        return TypeCategory::Unknown;
    }

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC is actually a float
        if db == DatabaseType::SQLite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    match lower.as_str() {
        "date" => return TypeCategory::Date,
        "time" => return TypeCategory::Time,
        "datetime" | "timestamp" => return TypeCategory::DateTime,
        "timestamptz" => return TypeCategory::Timestamp,
        _ => {}
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("int") || lower.contains("serial") || lower.contains("tiny") || lower == "year"
    {
        return TypeCategory::Integer;
    }

    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return TypeCategory::Float;
    }

    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    if lower == "uuid" {
        return TypeCategory::Uuid;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    if lower.contains("char") || lower.contains("text") || lower == "name" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// MySQL DECIMAL as the server's own text, so values wider than
/// `rust_decimal`'s 28 digits still decode.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Row Decoding
// =============================================================================

/// Extracts column names and native values from a driver row.
pub trait RowDecode {
    fn column_names(&self) -> Vec<String>;
    fn decode_values(&self) -> GatewayResult<Vec<NativeValue>>;
}

fn undecodable(idx: usize, type_name: &str, detail: impl std::fmt::Display) -> GatewayError {
    GatewayError::execution(
        format!(
            "Cannot decode column {} of type {}: {}",
            idx, type_name, detail
        ),
        None,
    )
}

fn or_null<T>(value: Option<T>, wrap: impl FnOnce(T) -> NativeValue) -> NativeValue {
    value.map_or(NativeValue::Null, wrap)
}

impl RowDecode for MySqlRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn decode_values(&self) -> GatewayResult<Vec<NativeValue>> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DatabaseType::MySQL);
                mysql::decode_column(self, idx, type_name, category)
            })
            .collect()
    }
}

impl RowDecode for PgRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn decode_values(&self) -> GatewayResult<Vec<NativeValue>> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DatabaseType::PostgreSQL);
                postgres::decode_column(self, idx, type_name, category)
            })
            .collect()
    }
}

impl RowDecode for SqliteRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn decode_values(&self) -> GatewayResult<Vec<NativeValue>> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DatabaseType::SQLite);
                sqlite::decode_column(self, idx, type_name, category)
            })
            .collect()
    }
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;

    pub fn decode_column(
        row: &MySqlRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
    ) -> GatewayResult<NativeValue> {
        match category {
            TypeCategory::Decimal => row
                .try_get::<Option<RawDecimal>, _>(idx)
                .map(|v| or_null(v, |d| NativeValue::Decimal(d.0)))
                .map_err(|e| undecodable(idx, type_name, e)),
            TypeCategory::Boolean => match row.try_get::<Option<bool>, _>(idx) {
                Ok(v) => Ok(or_null(v, NativeValue::Bool)),
                Err(_) => decode_integer(row, idx, type_name),
            },
            TypeCategory::Integer => decode_integer(row, idx, type_name),
            TypeCategory::Float => decode_float(row, idx, type_name),
            TypeCategory::Binary => row
                .try_get::<Option<Vec<u8>>, _>(idx)
                .map(|v| or_null(v, NativeValue::Bytes))
                .map_err(|e| undecodable(idx, type_name, e)),
            TypeCategory::Json => row
                .try_get::<Option<serde_json::Value>, _>(idx)
                .map(|v| or_null(v, NativeValue::Json))
                .map_err(|e| undecodable(idx, type_name, e)),
            TypeCategory::Date => row
                .try_get::<Option<NaiveDate>, _>(idx)
                .map(|v| or_null(v, NativeValue::Date))
                .map_err(|e| undecodable(idx, type_name, e)),
            TypeCategory::Time => row
                .try_get::<Option<NaiveTime>, _>(idx)
                .map(|v| or_null(v, NativeValue::Time))
                .map_err(|e| undecodable(idx, type_name, e)),
            TypeCategory::DateTime | TypeCategory::Timestamp => decode_datetime(row, idx, type_name),
            _ => decode_text(row, idx, type_name),
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize, type_name: &str) -> GatewayResult<NativeValue> {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Ok(or_null(v, NativeValue::Int));
        }
        if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
            return Ok(or_null(v, NativeValue::UInt));
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return Ok(or_null(v, |n| NativeValue::Int(n.into())));
        }
        if let Ok(v) = row.try_get::<Option<u32>, _>(idx) {
            return Ok(or_null(v, |n| NativeValue::UInt(n.into())));
        }
        if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
            return Ok(or_null(v, |n| NativeValue::Int(n.into())));
        }
        if let Ok(v) = row.try_get::<Option<u16>, _>(idx) {
            return Ok(or_null(v, |n| NativeValue::UInt(n.into())));
        }
        if let Ok(v) = row.try_get::<Option<i8>, _>(idx) {
            return Ok(or_null(v, |n| NativeValue::Int(n.into())));
        }
        row.try_get::<Option<u8>, _>(idx)
            .map(|v| or_null(v, |n| NativeValue::UInt(n.into())))
            .map_err(|e| undecodable(idx, type_name, e))
    }

    fn decode_float(row: &MySqlRow, idx: usize, type_name: &str) -> GatewayResult<NativeValue> {
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Ok(or_null(v, NativeValue::Float));
        }
        row.try_get::<Option<f32>, _>(idx)
            .map(|v| or_null(v, |f| NativeValue::Float(f.into())))
            .map_err(|e| undecodable(idx, type_name, e))
    }

    fn decode_datetime(row: &MySqlRow, idx: usize, type_name: &str) -> GatewayResult<NativeValue> {
        if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
            return Ok(or_null(v, NativeValue::DateTime));
        }
        row.try_get::<Option<DateTime<Utc>>, _>(idx)
            .map(|v| or_null(v, NativeValue::Timestamp))
            .map_err(|e| undecodable(idx, type_name, e))
    }

    /// VARCHAR, ENUM, SET and friends. Binary collations arrive as bytes.
    fn decode_text(row: &MySqlRow, idx: usize, type_name: &str) -> GatewayResult<NativeValue> {
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return Ok(or_null(v, NativeValue::Text));
        }
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .map(|v| or_null(v, NativeValue::Bytes))
            .map_err(|e| undecodable(idx, type_name, e))
    }
}

mod postgres {
    use super::*;
    use uuid::Uuid;

    pub fn decode_column(
        row: &PgRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
    ) -> GatewayResult<NativeValue> {
        let err = |e: sqlx::Error| undecodable(idx, type_name, e);
        match category {
            TypeCategory::Decimal => row
                .try_get::<Option<Decimal>, _>(idx)
                .map(|v| or_null(v, |d| NativeValue::Decimal(d.to_string())))
                .map_err(err),
            TypeCategory::Integer => decode_integer(row, idx, type_name),
            TypeCategory::Boolean => row
                .try_get::<Option<bool>, _>(idx)
                .map(|v| or_null(v, NativeValue::Bool))
                .map_err(err),
            TypeCategory::Float => {
                if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
                    return Ok(or_null(v, NativeValue::Float));
                }
                row.try_get::<Option<f32>, _>(idx)
                    .map(|v| or_null(v, |f| NativeValue::Float(f.into())))
                    .map_err(err)
            }
            TypeCategory::Binary => row
                .try_get::<Option<Vec<u8>>, _>(idx)
                .map(|v| or_null(v, NativeValue::Bytes))
                .map_err(err),
            TypeCategory::Json => row
                .try_get::<Option<serde_json::Value>, _>(idx)
                .map(|v| or_null(v, NativeValue::Json))
                .map_err(err),
            TypeCategory::Uuid => row
                .try_get::<Option<Uuid>, _>(idx)
                .map(|v| or_null(v, |u| NativeValue::Text(u.to_string())))
                .map_err(err),
            TypeCategory::Date => row
                .try_get::<Option<NaiveDate>, _>(idx)
                .map(|v| or_null(v, NativeValue::Date))
                .map_err(err),
            TypeCategory::Time => row
                .try_get::<Option<NaiveTime>, _>(idx)
                .map(|v| or_null(v, NativeValue::Time))
                .map_err(err),
            TypeCategory::DateTime => row
                .try_get::<Option<NaiveDateTime>, _>(idx)
                .map(|v| or_null(v, NativeValue::DateTime))
                .map_err(err),
            TypeCategory::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(idx)
                .map(|v| or_null(v, NativeValue::Timestamp))
                .map_err(err),
            TypeCategory::Array => decode_array(row, idx, type_name),
            _ => row
                .try_get::<Option<String>, _>(idx)
                .map(|v| or_null(v, NativeValue::Text))
                .map_err(err),
        }
    }

    fn decode_integer(row: &PgRow, idx: usize, type_name: &str) -> GatewayResult<NativeValue> {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Ok(or_null(v, NativeValue::Int));
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return Ok(or_null(v, |n| NativeValue::Int(n.into())));
        }
        row.try_get::<Option<i16>, _>(idx)
            .map(|v| or_null(v, |n| NativeValue::Int(n.into())))
            .map_err(|e| undecodable(idx, type_name, e))
    }

    fn decode_array(row: &PgRow, idx: usize, type_name: &str) -> GatewayResult<NativeValue> {
        fn list<T>(items: Vec<Option<T>>, wrap: impl Fn(T) -> NativeValue) -> NativeValue {
            NativeValue::List(items.into_iter().map(|v| or_null(v, &wrap)).collect())
        }

        if let Ok(v) = row.try_get::<Option<Vec<Option<i64>>>, _>(idx) {
            return Ok(or_null(v, |items| list(items, NativeValue::Int)));
        }
        if let Ok(v) = row.try_get::<Option<Vec<Option<i32>>>, _>(idx) {
            return Ok(or_null(v, |items| list(items, |n| NativeValue::Int(n.into()))));
        }
        if let Ok(v) = row.try_get::<Option<Vec<Option<f64>>>, _>(idx) {
            return Ok(or_null(v, |items| list(items, NativeValue::Float)));
        }
        if let Ok(v) = row.try_get::<Option<Vec<Option<bool>>>, _>(idx) {
            return Ok(or_null(v, |items| list(items, NativeValue::Bool)));
        }
        if let Ok(v) = row.try_get::<Option<Vec<Option<NaiveDate>>>, _>(idx) {
            return Ok(or_null(v, |items| list(items, NativeValue::Date)));
        }
        if let Ok(v) = row.try_get::<Option<Vec<Option<Decimal>>>, _>(idx) {
            return Ok(or_null(v, |items| {
                list(items, |d| NativeValue::Decimal(d.to_string()))
            }));
        }
        if let Ok(v) = row.try_get::<Option<Vec<Option<Uuid>>>, _>(idx) {
            return Ok(or_null(v, |items| {
                list(items, |u| NativeValue::Text(u.to_string()))
            }));
        }
        row.try_get::<Option<Vec<Option<String>>>, _>(idx)
            .map(|v| or_null(v, |items| list(items, NativeValue::Text)))
            .map_err(|e| undecodable(idx, type_name, e))
    }
}

mod sqlite {
    use super::*;

    /// SQLite columns are dynamically typed; the declared type only hints.
    pub fn decode_column(
        row: &SqliteRow,
        idx: usize,
        type_name: &str,
        category: TypeCategory,
    ) -> GatewayResult<NativeValue> {
        match category {
            TypeCategory::Boolean => {
                if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
                    return Ok(or_null(v, NativeValue::Bool));
                }
            }
            TypeCategory::Float | TypeCategory::Decimal => {
                if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
                    return Ok(or_null(v, NativeValue::Float));
                }
            }
            TypeCategory::Binary => {
                if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
                    return Ok(or_null(v, NativeValue::Bytes));
                }
            }
            TypeCategory::Json => {
                if let Ok(Some(text)) = row.try_get::<Option<String>, _>(idx) {
                    return Ok(match serde_json::from_str(&text) {
                        Ok(json) => NativeValue::Json(json),
                        Err(_) => NativeValue::Text(text),
                    });
                }
            }
            _ => {}
        }
        decode_by_storage(row, idx, type_name)
    }

    fn decode_by_storage(row: &SqliteRow, idx: usize, type_name: &str) -> GatewayResult<NativeValue> {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Ok(or_null(v, NativeValue::Int));
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Ok(or_null(v, NativeValue::Float));
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return Ok(or_null(v, NativeValue::Text));
        }
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .map(|v| or_null(v, NativeValue::Bytes))
            .map_err(|e| undecodable(idx, type_name, e))
    }
}
