// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Table model shared by the parser, the serializer and the views
// No I/O, no async

mod diagnostic;
mod table;

pub use diagnostic::ParseDiagnostic;
pub use table::{HeaderSet, Row, Table};
