// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Permissive parsing of model output, strict serialization for export

mod csv_parser;
mod csv_writer;
mod json_records;

pub use csv_parser::{parse, parse_with_diagnostics, ParsedCsv};
pub use csv_writer::{cell_text, escape_field, serialize};
pub use json_records::table_from_json;
