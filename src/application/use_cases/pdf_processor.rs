//! PDF processing workflow
//!
//! Sequences one extraction request at a time and owns the current result:
//! - `Idle` → `Submitting` → `Success` | `ParseFailed` | `CollaboratorFailed`
//! - a new submission from any terminal state discards the previous table
//! - a submission while `Submitting` is rejected with [`AppError::Busy`]
//! - export serializes whatever table the slot holds at call time

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::extract_pdf_data::ExtractPdfDataUseCase;
use crate::domain::csv::{ParseDiagnostic, Table};
use crate::domain::error::{AppError, Result};
use crate::domain::extraction::{FailureKind, PdfInput};
use crate::infrastructure::csv::{parse_with_diagnostics, serialize, table_from_json};
use crate::infrastructure::response::clean_llm_response;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Idle,
    Submitting,
    Success,
    ParseFailed,
    CollaboratorFailed,
}

/// Contents of the current-result slot.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorSnapshot {
    pub state: ProcessingState,
    pub submission_id: Option<Uuid>,
    pub source_name: Option<String>,
    pub table: Option<Arc<Table>>,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub error: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    export_name: Option<String>,
}

impl Default for ProcessorSnapshot {
    fn default() -> Self {
        Self {
            state: ProcessingState::Idle,
            submission_id: None,
            source_name: None,
            table: None,
            diagnostics: Vec::new(),
            error: None,
            failure_kind: None,
            finished_at: None,
            export_name: None,
        }
    }
}

impl ProcessorSnapshot {
    fn submitting(submission_id: Uuid, input: &PdfInput) -> Self {
        Self {
            state: ProcessingState::Submitting,
            submission_id: Some(submission_id),
            source_name: Some(input.display_name()),
            export_name: Some(input.export_file_name()),
            ..Self::default()
        }
    }

    fn finish(mut self, state: ProcessingState) -> Self {
        self.state = state;
        self.finished_at = Some(Utc::now());
        self
    }

    /// True when a non-empty table is available for download.
    pub fn can_export(&self) -> bool {
        self.table.as_ref().map(|table| !table.is_empty()).unwrap_or(false)
    }
}

/// CSV artifact ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub content: String,
}

pub struct PdfProcessor {
    extractor: Arc<ExtractPdfDataUseCase>,
    slot: Mutex<ProcessorSnapshot>,
}

impl PdfProcessor {
    pub fn new(extractor: Arc<ExtractPdfDataUseCase>) -> Self {
        Self {
            extractor,
            slot: Mutex::new(ProcessorSnapshot::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProcessorSnapshot>> {
        self.slot
            .lock()
            .map_err(|_| AppError::Internal("Processor state lock poisoned".to_string()))
    }

    pub fn snapshot(&self) -> Result<ProcessorSnapshot> {
        Ok(self.lock()?.clone())
    }

    /// Run one extraction and store its outcome in the result slot.
    ///
    /// Collaborator and parse failures are recorded in the returned snapshot,
    /// not returned as errors. `Err` means the submission never started.
    pub async fn submit(&self, input: PdfInput) -> Result<ProcessorSnapshot> {
        let submission_id = Uuid::new_v4();
        let pending = {
            let mut slot = self.lock()?;
            if slot.state == ProcessingState::Submitting {
                warn!(%submission_id, "Rejecting submission while another is in flight");
                return Err(AppError::Busy);
            }
            *slot = ProcessorSnapshot::submitting(submission_id, &input);
            slot.clone()
        };

        info!(%submission_id, source = ?pending.source_name, "Processing PDF");
        let guard = InFlight {
            slot: &self.slot,
            submission_id,
            armed: true,
        };

        let finished = match self.extractor.execute(&input).await {
            Ok(output) => interpret(pending, &output.extracted_data),
            Err(err) => collaborator_failure(pending, &err),
        };
        guard.disarm();

        info!(
            %submission_id,
            state = ?finished.state,
            rows = finished.table.as_ref().map(|t| t.len()).unwrap_or(0),
            diagnostics = finished.diagnostics.len(),
            "PDF processing finished"
        );

        *self.lock()? = finished.clone();
        Ok(finished)
    }

    /// Serialize the current table for download.
    pub fn export(&self) -> Result<CsvExport> {
        let (table, export_name) = {
            let slot = self.lock()?;
            (slot.table.clone(), slot.export_name.clone())
        };

        let table = table
            .filter(|table| !table.is_empty())
            .ok_or_else(|| {
                AppError::ValidationError("No data available to download.".to_string())
            })?;

        Ok(CsvExport {
            file_name: export_name.unwrap_or_else(|| "extracted_data.csv".to_string()),
            content: serialize(&table),
        })
    }
}

/// Turn the model's raw text into a terminal snapshot.
fn interpret(pending: ProcessorSnapshot, raw: &str) -> ProcessorSnapshot {
    let cleaned = clean_llm_response(raw);

    match table_from_json(&cleaned) {
        Some(Ok(table)) => ProcessorSnapshot {
            table: Some(Arc::new(table)),
            ..pending
        }
        .finish(ProcessingState::Success),
        Some(Err(err)) => {
            warn!(error = %err, "Model returned JSON that is not a table");
            ProcessorSnapshot {
                error: Some(err.user_message()),
                ..pending
            }
            .finish(ProcessingState::ParseFailed)
        }
        None => {
            let parsed = parse_with_diagnostics(&cleaned);
            ProcessorSnapshot {
                table: Some(Arc::new(parsed.table)),
                diagnostics: parsed.diagnostics,
                ..pending
            }
            .finish(ProcessingState::Success)
        }
    }
}

fn collaborator_failure(pending: ProcessorSnapshot, err: &AppError) -> ProcessorSnapshot {
    let raw = err.user_message();
    let kind = FailureKind::classify(&raw);
    warn!(error = %err, kind = ?kind, "Extraction request failed");

    ProcessorSnapshot {
        error: Some(kind.user_message(&raw)),
        failure_kind: Some(kind),
        ..pending
    }
    .finish(ProcessingState::CollaboratorFailed)
}

/// Leaves the slot in a terminal state if a submission future is dropped
/// before the model replies.
struct InFlight<'a> {
    slot: &'a Mutex<ProcessorSnapshot>,
    submission_id: Uuid,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut slot) = self.slot.lock() {
            if slot.submission_id == Some(self.submission_id)
                && slot.state == ProcessingState::Submitting
            {
                warn!(submission_id = %self.submission_id, "Submission dropped before completion");
                let pending = std::mem::take(&mut *slot);
                *slot = ProcessorSnapshot {
                    error: Some("Processing was interrupted. Please try again.".to_string()),
                    failure_kind: Some(FailureKind::Unknown),
                    ..pending
                }
                .finish(ProcessingState::CollaboratorFailed);
            }
        }
    }
}
