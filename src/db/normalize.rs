//! Conversion of native database values into transport-safe JSON scalars.
//!
//! Rules, first match wins:
//! - dates, times and timestamps become ISO-8601 strings
//! - fixed-point decimals become the nearest `f64` (precision loss is accepted;
//!   `DECIMAL(30,10)` values beyond ~15 significant digits are rounded)
//! - byte strings are decoded as UTF-8; invalid UTF-8 is an [`GatewayError::Encoding`]
//!   error, never a lossy substitution
//! - lists and maps are normalized element-wise, keeping order
//! - everything else passes through unchanged

use crate::error::{GatewayError, GatewayResult};
use crate::models::Row;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

/// A value as decoded from a database driver, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Exact decimal in its textual database representation
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Json(JsonValue),
    List(Vec<NativeValue>),
    /// Ordered key/value pairs
    Map(Vec<(String, NativeValue)>),
}

/// Normalize a single value (recursively for lists and maps).
pub fn normalize(value: NativeValue) -> GatewayResult<JsonValue> {
    Ok(match value {
        NativeValue::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
        NativeValue::Time(t) => JsonValue::String(t.format("%H:%M:%S%.f").to_string()),
        NativeValue::DateTime(dt) => {
            JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        NativeValue::Timestamp(ts) => {
            JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        }
        NativeValue::Decimal(text) => {
            let parsed: f64 = text.trim().parse().map_err(|_| {
                GatewayError::execution(format!("'{}' is not a decimal number", text), None)
            })?;
            float_value(parsed)
        }
        NativeValue::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => JsonValue::String(s),
            Err(e) => {
                return Err(GatewayError::encoding(format!(
                    "binary value is not valid UTF-8 (invalid byte at offset {})",
                    e.utf8_error().valid_up_to()
                )));
            }
        },
        NativeValue::List(items) => JsonValue::Array(
            items
                .into_iter()
                .map(normalize)
                .collect::<GatewayResult<Vec<_>>>()?,
        ),
        NativeValue::Map(entries) => {
            let mut map = serde_json::Map::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key, normalize(value)?);
            }
            JsonValue::Object(map)
        }
        NativeValue::Null => JsonValue::Null,
        NativeValue::Bool(b) => JsonValue::Bool(b),
        NativeValue::Int(i) => JsonValue::Number(i.into()),
        NativeValue::UInt(u) => JsonValue::Number(u.into()),
        NativeValue::Float(f) => float_value(f),
        NativeValue::Text(s) => JsonValue::String(s),
        NativeValue::Json(v) => v,
    })
}

/// Normalize one result row, pairing values with their column names.
///
/// Encoding failures name the offending column.
pub fn normalize_row(columns: &[String], values: Vec<NativeValue>) -> GatewayResult<Row> {
    let mut row = Row::with_capacity(columns.len());
    for (column, value) in columns.iter().zip(values) {
        let normalized = normalize(value).map_err(|e| match e {
            GatewayError::Encoding { message } => {
                GatewayError::encoding(format!("column '{}': {}", column, message))
            }
            other => other,
        })?;
        row.insert(column.clone(), normalized);
    }
    Ok(row)
}

/// NaN and infinities have no JSON number form; keep them as strings.
fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_decimal_becomes_float() {
        let value = normalize(NativeValue::Decimal("12.50".to_string())).unwrap();
        assert_eq!(value, json!(12.5));
    }

    #[test]
    fn test_invalid_decimal_text_is_execution_error() {
        let err = normalize(NativeValue::Decimal("abc".to_string())).unwrap_err();
        assert!(matches!(err, GatewayError::Execution { .. }));
    }

    #[test]
    fn test_date_becomes_iso_string() {
        let value = normalize(NativeValue::Date(date(2024, 1, 1))).unwrap();
        assert_eq!(value, json!("2024-01-01"));
    }

    #[test]
    fn test_time_and_datetime_iso_format() {
        let t = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(normalize(NativeValue::Time(t)).unwrap(), json!("09:05:00"));

        let dt = date(2024, 3, 15).and_hms_micro_opt(10, 30, 0, 250_000).unwrap();
        assert_eq!(
            normalize(NativeValue::DateTime(dt)).unwrap(),
            json!("2024-03-15T10:30:00.250")
        );

        let whole = date(2024, 3, 15).and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(
            normalize(NativeValue::DateTime(whole)).unwrap(),
            json!("2024-03-15T10:30:00")
        );
    }

    #[test]
    fn test_timestamp_keeps_utc_offset() {
        let ts = date(2024, 1, 1).and_hms_opt(0, 0, 0).unwrap().and_utc();
        assert_eq!(
            normalize(NativeValue::Timestamp(ts)).unwrap(),
            json!("2024-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_valid_utf8_bytes_become_text() {
        let value = normalize(NativeValue::Bytes("héllo".as_bytes().to_vec())).unwrap();
        assert_eq!(value, json!("héllo"));
    }

    #[test]
    fn test_invalid_utf8_bytes_are_encoding_error() {
        let err = normalize(NativeValue::Bytes(vec![0x61, 0xFF, 0xFE])).unwrap_err();
        match err {
            GatewayError::Encoding { message } => assert!(message.contains("offset 1")),
            other => panic!("expected encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_map_is_normalized_recursively() {
        let value = NativeValue::Map(vec![(
            "a".to_string(),
            NativeValue::List(vec![NativeValue::Date(date(2024, 1, 1))]),
        )]);
        assert_eq!(normalize(value).unwrap(), json!({"a": ["2024-01-01"]}));
    }

    #[test]
    fn test_map_keeps_key_order() {
        let value = NativeValue::Map(vec![
            ("z".to_string(), NativeValue::Int(1)),
            ("a".to_string(), NativeValue::Int(2)),
        ]);
        let normalized = normalize(value).unwrap();
        let keys: Vec<_> = normalized.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(normalize(NativeValue::Null).unwrap(), JsonValue::Null);
        assert_eq!(normalize(NativeValue::Bool(true)).unwrap(), json!(true));
        assert_eq!(normalize(NativeValue::Int(-7)).unwrap(), json!(-7));
        assert_eq!(normalize(NativeValue::UInt(u64::MAX)).unwrap(), json!(u64::MAX));
        assert_eq!(normalize(NativeValue::Float(1.25)).unwrap(), json!(1.25));
        assert_eq!(
            normalize(NativeValue::Text("x".to_string())).unwrap(),
            json!("x")
        );
        assert_eq!(
            normalize(NativeValue::Json(json!({"k": [1, 2]}))).unwrap(),
            json!({"k": [1, 2]})
        );
    }

    #[test]
    fn test_nan_float_becomes_string() {
        assert_eq!(normalize(NativeValue::Float(f64::NAN)).unwrap(), json!("NaN"));
    }

    #[test]
    fn test_normalize_row_names_bad_column() {
        let columns = vec!["id".to_string(), "payload".to_string()];
        let err = normalize_row(
            &columns,
            vec![NativeValue::Int(1), NativeValue::Bytes(vec![0xC3])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("column 'payload'"));
    }

    #[test]
    fn test_normalize_row_keys_match_columns() {
        let columns = vec!["b".to_string(), "a".to_string()];
        let row = normalize_row(
            &columns,
            vec![NativeValue::Int(1), NativeValue::Text("x".to_string())],
        )
        .unwrap();
        assert_eq!(row.len(), columns.len());
        let keys: Vec<_> = row.keys().cloned().collect();
        assert_eq!(keys, columns);
    }
}
