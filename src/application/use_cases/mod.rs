pub mod extract_pdf_data;
pub mod pdf_processor;
