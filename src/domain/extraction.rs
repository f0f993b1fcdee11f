use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const PDF_DATA_URI_PREFIX: &str = "data:application/pdf;base64,";
const PDF_MAGIC: &[u8] = b"%PDF-";

const DEFAULT_EXPORT_STEM: &str = "extracted_data";
const DEFAULT_URL_EXPORT_STEM: &str = "url_extracted_data";

/// Where the extraction collaborator reads the PDF from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfSource {
    /// `data:application/pdf;base64,...`
    DataUri(String),
    /// Publicly reachable http(s) URL.
    Url(url::Url),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    Upload { file_name: Option<String> },
    Link,
}

/// A validated PDF reference, ready to hand to the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfInput {
    source: PdfSource,
    origin: Origin,
}

impl PdfInput {
    /// Validate uploaded bytes and wrap them in a Base64 data URI.
    pub fn from_upload(
        bytes: &[u8],
        file_name: Option<String>,
        content_type: Option<&str>,
        max_bytes: usize,
    ) -> Result<Self> {
        if bytes.is_empty() {
            return Err(AppError::ValidationError(
                "No PDF Provided: Please upload a PDF file or enter a valid PDF URL.".to_string(),
            ));
        }

        let declared_pdf = content_type
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with(PDF_MIME_TYPE))
            .unwrap_or(false);
        if !declared_pdf && !bytes.starts_with(PDF_MAGIC) {
            return Err(AppError::ValidationError(
                "Invalid File Type: Please upload a PDF file.".to_string(),
            ));
        }

        if bytes.len() > max_bytes {
            return Err(AppError::ValidationError(format!(
                "File Too Large: Please upload a PDF file smaller than {}MB.",
                max_bytes / (1024 * 1024)
            )));
        }

        let file_name = file_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(Self {
            source: PdfSource::DataUri(format!("{}{}", PDF_DATA_URI_PREFIX, STANDARD.encode(bytes))),
            origin: Origin::Upload { file_name },
        })
    }

    /// Accept either a Base64 PDF data URI or a public http(s) URL.
    pub fn from_link(link: &str) -> Result<Self> {
        let link = link.trim();
        if link.is_empty() {
            return Err(AppError::ValidationError(
                "No PDF Provided: Please upload a PDF file or enter a valid PDF URL.".to_string(),
            ));
        }

        let invalid = || {
            AppError::ValidationError(
                "Invalid URL: Please enter a valid public PDF URL or a Base64 data URI."
                    .to_string(),
            )
        };

        if let Some(payload) = link.strip_prefix(PDF_DATA_URI_PREFIX) {
            if payload.is_empty() || STANDARD.decode(payload).is_err() {
                return Err(invalid());
            }
            return Ok(Self {
                source: PdfSource::DataUri(link.to_string()),
                origin: Origin::Link,
            });
        }

        if link.starts_with("http://") || link.starts_with("https://") {
            let url = url::Url::parse(link).map_err(|_| invalid())?;
            if url.host_str().is_none() {
                return Err(invalid());
            }
            return Ok(Self {
                source: PdfSource::Url(url),
                origin: Origin::Link,
            });
        }

        Err(invalid())
    }

    pub fn source(&self) -> &PdfSource {
        &self.source
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.source, PdfSource::Url(_))
    }

    /// Human-readable label for logs and the result view.
    pub fn display_name(&self) -> String {
        match (&self.origin, &self.source) {
            (Origin::Upload { file_name: Some(name) }, _) => name.clone(),
            (Origin::Upload { file_name: None }, _) => "uploaded PDF".to_string(),
            (Origin::Link, PdfSource::Url(url)) => url.to_string(),
            (Origin::Link, PdfSource::DataUri(_)) => "Base64 data URI".to_string(),
        }
    }

    /// File name offered for the CSV download of this input's table.
    pub fn export_file_name(&self) -> String {
        let stem = match (&self.origin, &self.source) {
            (Origin::Upload { file_name: Some(name) }, _) => {
                non_empty(sanitize_file_stem(strip_extension(name)))
                    .unwrap_or_else(|| DEFAULT_EXPORT_STEM.to_string())
            }
            (Origin::Upload { file_name: None }, _) => DEFAULT_EXPORT_STEM.to_string(),
            (Origin::Link, PdfSource::Url(url)) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(strip_extension)
                .map(sanitize_file_stem)
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_URL_EXPORT_STEM.to_string()),
            (Origin::Link, PdfSource::DataUri(_)) => DEFAULT_URL_EXPORT_STEM.to_string(),
        };
        format!("{}.csv", stem)
    }
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}

fn sanitize_file_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Payload returned by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractPdfDataOutput {
    pub extracted_data: String,
}

/// Category of a failed collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    InvalidInput,
    Unknown,
}

impl FailureKind {
    /// Classify by the substrings the model API puts in its error messages.
    pub fn classify(message: &str) -> Self {
        let lowered = message.to_ascii_lowercase();
        if message.contains("DEADLINE_EXCEEDED")
            || lowered.contains("timeout")
            || lowered.contains("timed out")
        {
            FailureKind::Timeout
        } else if message.contains("INVALID_ARGUMENT") {
            FailureKind::InvalidInput
        } else {
            FailureKind::Unknown
        }
    }

    /// User-facing text; unknown failures keep the collaborator's own message.
    pub fn user_message(&self, raw: &str) -> String {
        match self {
            FailureKind::Timeout => "Processing timed out. The PDF might be too large/complex or the URL inaccessible. Please try a smaller PDF or upload the file directly.".to_string(),
            FailureKind::InvalidInput => "Invalid PDF or URL. Please check your input, ensure the PDF is not corrupted and the URL is correct and publicly accessible.".to_string(),
            FailureKind::Unknown if raw.trim().is_empty() => {
                "An unknown error occurred during PDF processing.".to_string()
            }
            FailureKind::Unknown => raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: usize = 10 * 1024 * 1024;

    #[test]
    fn test_upload_becomes_data_uri() {
        let input = PdfInput::from_upload(b"%PDF-1.7 body", Some("ranks.pdf".into()), None, MAX)
            .unwrap();

        match input.source() {
            PdfSource::DataUri(uri) => {
                assert!(uri.starts_with(PDF_DATA_URI_PREFIX));
                let payload = uri.strip_prefix(PDF_DATA_URI_PREFIX).unwrap();
                assert_eq!(STANDARD.decode(payload).unwrap(), b"%PDF-1.7 body");
            }
            other => panic!("unexpected source {:?}", other),
        }
        assert_eq!(input.export_file_name(), "ranks.csv");
    }

    #[test]
    fn test_upload_rejects_non_pdf() {
        let err = PdfInput::from_upload(b"hello", None, Some("text/plain"), MAX).unwrap_err();
        assert!(err.user_message().starts_with("Invalid File Type"));
    }

    #[test]
    fn test_upload_accepts_declared_content_type() {
        assert!(PdfInput::from_upload(b"bytes", None, Some("application/pdf"), MAX).is_ok());
    }

    #[test]
    fn test_upload_rejects_oversized_file() {
        let err = PdfInput::from_upload(b"%PDF-123456", None, None, 4).unwrap_err();
        assert!(err.user_message().starts_with("File Too Large"));
    }

    #[test]
    fn test_upload_rejects_empty_body() {
        let err = PdfInput::from_upload(b"", None, Some("application/pdf"), MAX).unwrap_err();
        assert!(err.user_message().starts_with("No PDF Provided"));
    }

    #[test]
    fn test_link_accepts_https_url() {
        let input = PdfInput::from_link("  https://example.com/docs/cutoffs.2024.pdf ").unwrap();
        assert!(input.is_remote());
        assert_eq!(input.export_file_name(), "cutoffs.2024.csv");
    }

    #[test]
    fn test_link_without_file_segment_uses_url_default() {
        let input = PdfInput::from_link("https://example.com/").unwrap();
        assert_eq!(input.export_file_name(), "url_extracted_data.csv");
    }

    #[test]
    fn test_link_accepts_pdf_data_uri() {
        let uri = format!("{}{}", PDF_DATA_URI_PREFIX, STANDARD.encode(b"%PDF-1.4"));
        let input = PdfInput::from_link(&uri).unwrap();
        assert!(!input.is_remote());
        assert_eq!(input.export_file_name(), "url_extracted_data.csv");
    }

    #[test]
    fn test_link_rejects_other_schemes() {
        for link in ["ftp://example.com/a.pdf", "example.com/a.pdf", "data:application/pdf;base64,!!"] {
            let err = PdfInput::from_link(link).unwrap_err();
            assert!(err.user_message().starts_with("Invalid URL"), "{}", link);
        }
    }

    #[test]
    fn test_upload_name_without_extension_is_kept() {
        let input = PdfInput::from_upload(b"%PDF-", Some("report".into()), None, MAX).unwrap();
        assert_eq!(input.export_file_name(), "report.csv");
    }

    #[test]
    fn test_export_name_sanitizes_quotes() {
        let input =
            PdfInput::from_upload(b"%PDF-", Some("a\"b;c.pdf".into()), None, MAX).unwrap();
        assert_eq!(input.export_file_name(), "a_b_c.csv");
    }

    #[test]
    fn test_classify_failures() {
        assert_eq!(FailureKind::classify("4 DEADLINE_EXCEEDED"), FailureKind::Timeout);
        assert_eq!(FailureKind::classify("Request timeout after 120s"), FailureKind::Timeout);
        assert_eq!(
            FailureKind::classify("API error (400): INVALID_ARGUMENT"),
            FailureKind::InvalidInput
        );
        assert_eq!(FailureKind::classify("quota exhausted"), FailureKind::Unknown);
    }

    #[test]
    fn test_unknown_failure_keeps_message() {
        assert_eq!(FailureKind::Unknown.user_message("quota exhausted"), "quota exhausted");
        assert_eq!(
            FailureKind::Unknown.user_message(""),
            "An unknown error occurred during PDF processing."
        );
    }
}
