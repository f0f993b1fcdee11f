use serde::Serialize;
use std::fmt;

/// Non-fatal observation recorded while parsing model output.
///
/// `line` is 1-based and counts every line of the input, blank ones included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseDiagnostic {
    /// Fewer fields than headers; the missing cells were filled with "".
    PartialRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// More fields than headers; the trailing fields were dropped.
    ExtraFields {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// A short line whose fields were all blank.
    BlankRowSkipped { line: usize },
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseDiagnostic::PartialRow {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {}: {} of {} fields present, remaining cells left empty",
                line, found, expected
            ),
            ParseDiagnostic::ExtraFields {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {}: {} fields for {} headers, extra fields dropped",
                line, found, expected
            ),
            ParseDiagnostic::BlankRowSkipped { line } => {
                write!(f, "line {}: blank separator row skipped", line)
            }
        }
    }
}
