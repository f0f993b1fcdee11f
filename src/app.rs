use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::application::{ExtractPdfDataUseCase, PdfProcessor};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::llm_clients::client_for;
use crate::interfaces::http::{start_server, HttpState};

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let config = AppConfig::load().map_err(|err| {
        error!(error = %err, "Failed to load configuration");
        err
    })?;
    if config.llm.api_key.is_none() {
        error!("No Gemini API key configured; extraction requests will fail");
    }

    let extractor = Arc::new(ExtractPdfDataUseCase::new(
        client_for(&config.llm),
        config.llm.clone(),
        config.extraction.columns.clone(),
    ));
    let processor = Arc::new(PdfProcessor::new(extractor));
    let state = HttpState::new(&config, processor)?;

    info!(
        model = %config.llm.model,
        columns = config.extraction.columns.len(),
        scripts_dir = %config.scripts_dir.display(),
        "Starting PDF scraper"
    );

    start_server(&config.server, state)?
        .await
        .map_err(|err| AppError::IoError(format!("HTTP server stopped: {}", err)))
}
