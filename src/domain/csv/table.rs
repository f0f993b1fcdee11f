// ============================================================
// TABLE TYPES
// ============================================================
// Ordered headers plus positional rows

use serde::Serialize;

/// Ordered column names taken from the first line of a CSV document.
///
/// Headers are addressed by position, so two columns may carry the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderSet(Vec<String>);

impl HeaderSet {
    pub fn new(headers: Vec<String>) -> Self {
        Self(headers)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Position of the first header with this name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|header| header == name)
    }
}

/// One data line, holding exactly one value per header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row(Vec<String>);

impl Row {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Rows sharing a single [`HeaderSet`].
///
/// The table owns the "one value per header" invariant: rows pushed with too
/// few values are padded with empty strings, rows with too many are cut.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    headers: HeaderSet,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: HeaderSet) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// The canonical "nothing here" table: no headers, no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, mut values: Vec<String>) {
        values.resize(self.headers.len(), String::new());
        self.rows.push(Row(values));
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows, even if headers exist.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup by row index and header name.
    pub fn get(&self, row: usize, header: &str) -> Option<&str> {
        let column = self.headers.position(header)?;
        self.rows.get(row)?.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> HeaderSet {
        HeaderSet::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_push_row_pads_missing_values() {
        let mut table = Table::new(headers(&["A", "B", "C"]));
        table.push_row(vec!["x".to_string()]);

        assert_eq!(table.rows()[0].values(), &["x", "", ""]);
        assert_eq!(table.get(0, "C"), Some(""));
    }

    #[test]
    fn test_push_row_truncates_extra_values() {
        let mut table = Table::new(headers(&["A"]));
        table.push_row(vec!["1".to_string(), "2".to_string()]);

        assert_eq!(table.rows()[0].len(), 1);
        assert_eq!(table.get(0, "A"), Some("1"));
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let table = Table::new(headers(&["Phase", "Course"]));
        assert!(table.is_empty());
        assert_eq!(table.headers().len(), 2);
    }

    #[test]
    fn test_serializes_as_headers_and_rows() {
        let mut table = Table::new(headers(&["A"]));
        table.push_row(vec!["1".to_string()]);

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json, serde_json::json!({"headers": ["A"], "rows": [["1"]]}));
    }
}
