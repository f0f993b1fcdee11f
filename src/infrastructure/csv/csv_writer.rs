// ============================================================
// CSV WRITER
// ============================================================
// Strict, deterministic serializer for tables

use serde_json::Value;

use crate::domain::csv::Table;

/// Serialize a table to CSV text.
///
/// A table without rows serializes to "", header-only output is never
/// produced. Rows are joined with '\n' and there is no trailing newline.
pub fn serialize(table: &Table) -> String {
    if table.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(table.len() + 1);
    lines.push(join_record(table.headers().iter()));
    for row in table.rows() {
        lines.push(join_record(row.values().iter().map(String::as_str)));
    }

    lines.join("\n")
}

fn join_record<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    cells.map(escape_field).collect::<Vec<_>>().join(",")
}

/// Double every quote, then wrap the field if it holds a comma, newline or quote.
pub fn escape_field(value: &str) -> String {
    let escaped = value.replace('"', "\"\"");
    if escaped.contains(',') || escaped.contains('\n') || escaped.contains('"') {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}

/// Text form of an arbitrary cell value.
///
/// Null becomes "", objects and arrays become their JSON text, strings are
/// taken as-is and everything else uses its display form.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
