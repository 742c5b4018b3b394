//! Plain-text rendering of query results and schemas for the CLI.

use crate::models::{DatabaseSchema, QueryResult};
use serde_json::Value as JsonValue;
use unicode_width::UnicodeWidthStr;

pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(arr) => serde_json::to_string(arr).unwrap_or_default(),
        JsonValue::Object(obj) => serde_json::to_string(obj).unwrap_or_default(),
    }
}

/// ASCII table in the style of the MySQL client.
pub fn format_as_table(result: &QueryResult) -> String {
    let columns = &result.columns;
    if columns.is_empty() {
        return "Empty set\n".to_string();
    }

    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();
    for row in &result.rows {
        for (i, col) in columns.iter().enumerate() {
            if let Some(value) = row.get(col) {
                widths[i] = widths[i].max(format_value(value).width());
            }
        }
    }

    let mut output = String::new();
    let separator: String = widths
        .iter()
        .map(|w| format!("+{}", "-".repeat(w + 2)))
        .collect::<String>()
        + "+\n";

    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("| {} ", pad(col, *w, false)))
        .collect::<String>()
        + "|\n";
    output.push_str(&header);
    output.push_str(&separator);

    for row in &result.rows {
        let line: String = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| {
                let value = row.get(col).unwrap_or(&JsonValue::Null);
                let formatted = format_value(value);
                format!("| {} ", pad(&formatted, *w, value.is_number()))
            })
            .collect::<String>()
            + "|\n";
        output.push_str(&line);
    }

    output.push_str(&separator);
    let noun = if result.row_count == 1 { "row" } else { "rows" };
    output.push_str(&format!("{} {} in set\n", result.row_count, noun));
    output
}

/// Pads by display width; `format!` width counts chars, not terminal columns.
fn pad(text: &str, width: usize, right_align: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(text.width()));
    if right_align {
        format!("{}{}", fill, text)
    } else {
        format!("{}{}", text, fill)
    }
}

/// One block per table: column list and sample row count.
pub fn format_schema_summary(schema: &DatabaseSchema) -> String {
    if schema.is_empty() {
        return "No tables found\n".to_string();
    }

    let mut output = format!("{} table(s)\n", schema.len());
    for (name, table) in schema {
        output.push_str(&format!("\n{}\n", name));
        for column in &table.columns {
            output.push_str(&format!("  - {} ({})\n", column.name, column.declared_type));
        }
        output.push_str(&format!("  {} sample row(s)\n", table.sample_rows.len()));
    }
    output
}
