use crate::domain::error::Result;
use crate::domain::extraction::{ExtractPdfDataOutput, PdfInput, PdfSource, PDF_DATA_URI_PREFIX, PDF_MIME_TYPE};
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::llm_clients::{Attachment, GenerateRequest, LLMClient};
use std::sync::Arc;
use tracing::info;

/// Asks the model to turn a PDF into CSV text with a fixed column set.
pub struct ExtractPdfDataUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
    config: LLMConfig,
    columns: Vec<String>,
}

impl ExtractPdfDataUseCase {
    pub fn new(
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        config: LLMConfig,
        columns: Vec<String>,
    ) -> Self {
        Self {
            llm_client,
            config,
            columns,
        }
    }

    pub async fn execute(&self, input: &PdfInput) -> Result<ExtractPdfDataOutput> {
        let request = GenerateRequest {
            system: build_system_prompt(&self.columns),
            user: "Here is the PDF document. Return only the CSV.".to_string(),
            attachment: Some(attachment_for(input)),
        };

        info!(
            source = %input.display_name(),
            remote = input.is_remote(),
            model = %self.config.model,
            "Requesting table extraction"
        );

        let extracted_data = self.llm_client.generate(&self.config, &request).await?;

        Ok(ExtractPdfDataOutput { extracted_data })
    }
}

fn attachment_for(input: &PdfInput) -> Attachment {
    match input.source() {
        PdfSource::DataUri(uri) => Attachment::Inline {
            mime_type: PDF_MIME_TYPE.to_string(),
            data: uri
                .strip_prefix(PDF_DATA_URI_PREFIX)
                .unwrap_or(uri)
                .to_string(),
        },
        PdfSource::Url(url) => Attachment::Remote {
            mime_type: PDF_MIME_TYPE.to_string(),
            uri: url.to_string(),
        },
    }
}

fn build_system_prompt(columns: &[String]) -> String {
    let header = columns.join(",");
    format!(
        r#"You are an expert data extraction specialist. Your task is to meticulously extract specific tabular data from ALL PAGES of the provided PDF document and return it as a single, valid CSV string.

The required columns for the CSV are EXACTLY: {header}

Instructions for the columns:
- Phase: if no phase information is explicitly found for a row, default this value to '1'.
- Course: the course or program name. It may appear at the top of a page or section; associate it with every data row it applies to.
- College_Name: the full name of the college on a single line, with no newline characters.
- College_Code: the college code, often found directly to the left of the college name or in an adjacent column.
- Rank categories: for each rank category column, extract the corresponding rank value. Leave the cell empty when the category is not present for a row. Do NOT create a generic "Rank_Details" column.

General rules:
- Process ALL pages. If a table spans multiple pages, append the rows sequentially.
- The VERY FIRST ROW of the output MUST be exactly: {header}
- If a field is not found or not applicable for a row, leave the cell empty.
- Keep each cell on a single line; replace newlines inside cell text with a space.
- Values containing commas or quotes must be enclosed in double quotes, and internal double quotes must be escaped as "".
- Do NOT include explanatory text, summaries, Markdown fences or anything other than the CSV data itself."#
    )
}
