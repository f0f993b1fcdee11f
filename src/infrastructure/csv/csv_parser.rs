// ============================================================
// CSV PARSER
// ============================================================
// Permissive, quote-aware parser for model-generated CSV text.
// Never fails: malformed input degrades to fewer or padded rows.

use tracing::{debug, warn};

use crate::domain::csv::{HeaderSet, ParseDiagnostic, Table};

/// Parser output: the table plus what had to be patched up to build it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCsv {
    pub table: Table,
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Parse CSV text into a [`Table`], discarding diagnostics.
pub fn parse(text: &str) -> Table {
    parse_with_diagnostics(text).table
}

/// Parse CSV text into a [`Table`].
///
/// The first non-blank line supplies the headers; blank header cells are
/// dropped and a header line with no usable cells yields an empty table.
/// Every later non-blank line becomes one row:
/// - at least as many fields as headers: the first N are kept
/// - fewer fields, all blank: the line is skipped
/// - fewer fields otherwise: the missing cells are filled with ""
pub fn parse_with_diagnostics(text: &str) -> ParsedCsv {
    let mut lines = text
        .split('\n')
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return ParsedCsv::default();
    };

    let headers: Vec<String> = split_fields(header_line)
        .into_iter()
        .filter(|header| !header.is_empty())
        .collect();
    if headers.is_empty() {
        debug!("CSV header line has no usable fields");
        return ParsedCsv::default();
    }

    let header_count = headers.len();
    let mut table = Table::new(HeaderSet::new(headers));
    let mut diagnostics = Vec::new();

    for (line_no, line) in lines {
        let mut fields = split_fields(line);
        let found = fields.len();

        if found >= header_count {
            if found > header_count {
                debug!(line = line_no, expected = header_count, found, "Dropping extra CSV fields");
                diagnostics.push(ParseDiagnostic::ExtraFields {
                    line: line_no,
                    expected: header_count,
                    found,
                });
                fields.truncate(header_count);
            }
            table.push_row(fields);
        } else if fields.iter().all(|field| field.is_empty()) {
            debug!(line = line_no, "Skipping blank CSV separator row");
            diagnostics.push(ParseDiagnostic::BlankRowSkipped { line: line_no });
        } else {
            warn!(
                line = line_no,
                expected = header_count,
                found,
                "CSV row has fewer fields than headers, filling with empty values"
            );
            diagnostics.push(ParseDiagnostic::PartialRow {
                line: line_no,
                expected: header_count,
                found,
            });
            table.push_row(fields);
        }
    }

    ParsedCsv { table, diagnostics }
}

/// Split one line on unquoted commas, then clean each field.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(clean_field(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    fields.push(clean_field(&current));

    fields
}

/// Trim, then unwrap a field still enclosed in one pair of quotes.
fn clean_field(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].replace("\"\"", "\"")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let table = parse("name,age,city\nAlice,30,NYC\nBob,25,LA");

        assert_eq!(table.headers().as_slice(), &["name", "age", "city"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "name"), Some("Alice"));
        assert_eq!(table.get(1, "city"), Some("LA"));
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert_eq!(parse(""), Table::empty());
        assert_eq!(parse("   \n  "), Table::empty());
    }

    #[test]
    fn test_header_only_input() {
        let table = parse("Phase,Course\n");

        assert_eq!(table.headers().as_slice(), &["Phase", "Course"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_blank_header_line_yields_empty_table() {
        assert_eq!(parse(",,\ndata1,data2,data3"), Table::empty());
    }

    #[test]
    fn test_blank_header_cells_are_dropped() {
        let table = parse("A,, B ,\n1,2,3");

        assert_eq!(table.headers().as_slice(), &["A", "B"]);
        assert_eq!(table.rows()[0].values(), &["1", "2"]);
    }

    #[test]
    fn test_short_row_is_padded() {
        let parsed = parse_with_diagnostics("A,B,C\nx,y");

        assert_eq!(parsed.table.len(), 1);
        assert_eq!(parsed.table.get(0, "A"), Some("x"));
        assert_eq!(parsed.table.get(0, "B"), Some("y"));
        assert_eq!(parsed.table.get(0, "C"), Some(""));
        assert_eq!(
            parsed.diagnostics,
            vec![ParseDiagnostic::PartialRow {
                line: 2,
                expected: 3,
                found: 2
            }]
        );
    }

    #[test]
    fn test_short_blank_row_is_skipped() {
        let parsed = parse_with_diagnostics("A,B,C\n , \n1,2,3");

        assert_eq!(parsed.table.len(), 1);
        assert_eq!(parsed.table.get(0, "A"), Some("1"));
        assert_eq!(
            parsed.diagnostics,
            vec![ParseDiagnostic::BlankRowSkipped { line: 2 }]
        );
    }

    #[test]
    fn test_extra_fields_are_dropped() {
        let parsed = parse_with_diagnostics("A,B\n1,2,3,4");

        assert_eq!(parsed.table.rows()[0].values(), &["1", "2"]);
        assert!(matches!(
            parsed.diagnostics.as_slice(),
            [ParseDiagnostic::ExtraFields { line: 2, expected: 2, found: 4 }]
        ));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let table = parse("\n\nA,B\n\n1,2\n   \n3,4\n");

        assert_eq!(table.headers().as_slice(), &["A", "B"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1, "B"), Some("4"));
    }

    #[test]
    fn test_quoted_comma_stays_in_field() {
        let table = parse("College_Name,Code\n\"Bar, Baz College\",42");

        assert_eq!(table.get(0, "College_Name"), Some("Bar, Baz College"));
        assert_eq!(table.get(0, "Code"), Some("42"));
    }

    #[test]
    fn test_escaped_quotes_are_unescaped() {
        let table = parse("quote\n\"He said \"\"hi\"\", then left\"");

        assert_eq!(table.get(0, "quote"), Some("He said \"hi\", then left"));
    }

    #[test]
    fn test_fields_are_trimmed() {
        let table = parse("A , B\n  x  ,\t y \r\n");

        assert_eq!(table.headers().as_slice(), &["A", "B"]);
        assert_eq!(table.rows()[0].values(), &["x", "y"]);
    }

    #[test]
    fn test_space_before_quoted_field() {
        let table = parse("A,B\n1, \"two, three\"");

        assert_eq!(table.get(0, "B"), Some("two, three"));
    }

    #[test]
    fn test_unterminated_quote_keeps_rest_of_line() {
        let table = parse("A,B\n\"open,still open");

        assert_eq!(table.get(0, "A"), Some("open,still open"));
        assert_eq!(table.get(0, "B"), Some(""));
    }

    #[test]
    fn test_duplicate_headers_are_positional() {
        let table = parse("SM,SM\n1,2");

        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.rows()[0].values(), &["1", "2"]);
    }

    #[test]
    fn test_split_fields_cleanup_pass() {
        assert_eq!(split_fields("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_fields("\"hello, world\",test"), vec!["hello, world", "test"]);
        assert_eq!(split_fields(",,"), vec!["", "", ""]);
        assert_eq!(clean_field("  \"x \"\"y\"\"\"  "), "x \"y\"");
        assert_eq!(clean_field("\""), "\"");
    }
}
