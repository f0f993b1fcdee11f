pub mod use_cases;

pub use use_cases::extract_pdf_data::ExtractPdfDataUseCase;
pub use use_cases::pdf_processor::{CsvExport, PdfProcessor, ProcessingState, ProcessorSnapshot};
