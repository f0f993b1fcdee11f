// ============================================================
// JSON RECORDS
// ============================================================
// Some model responses come back as a JSON array of objects instead of CSV.

use serde_json::Value;
use tracing::warn;

use super::csv_writer::cell_text;
use crate::domain::csv::{HeaderSet, Table};
use crate::domain::error::{AppError, Result};

/// Decode a JSON array of objects into a table.
///
/// Returns `None` when the text is not JSON at all, so the caller can fall
/// back to the CSV parser. Headers are the keys of the first object, in order.
pub fn table_from_json(text: &str) -> Option<Result<Table>> {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
        return None;
    }
    let value: Value = serde_json::from_str(trimmed).ok()?;

    let Value::Array(items) = value else {
        return Some(Err(AppError::ParseError(
            "Extracted data is not in a table format. AI might have struggled with this PDF structure."
                .to_string(),
        )));
    };

    let Some(first) = items.first() else {
        return Some(Ok(Table::empty()));
    };
    let Value::Object(first) = first else {
        return Some(Err(AppError::ParseError(
            "Extracted data items are not structured correctly. AI might have struggled with this PDF."
                .to_string(),
        )));
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut table = Table::new(HeaderSet::new(headers.clone()));

    for (idx, item) in items.iter().enumerate() {
        let Value::Object(record) = item else {
            warn!(index = idx, "Skipping non-object item in JSON table output");
            continue;
        };
        let values = headers
            .iter()
            .map(|header| record.get(header).map(cell_text).unwrap_or_default())
            .collect();
        table.push_row(values);
    }

    Some(Ok(table))
}
