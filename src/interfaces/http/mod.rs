pub mod session;
pub mod views;

use crate::application::{PdfProcessor, ProcessingState};
use crate::domain::error::{AppError, Result};
use crate::domain::extraction::PdfInput;
use crate::infrastructure::config::{AppConfig, AuthConfig, ServerConfig};
use crate::infrastructure::security::PasswordGate;
use crate::infrastructure::storage::ScriptStore;
use actix_web::http::header::{self, ContentDisposition};
use actix_web::http::StatusCode;
use actix_web::{
    dev::Server, get, middleware, post, web, App, HttpRequest, HttpResponse, HttpServer,
    Responder, ResponseError,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use validator::Validate;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub processor: Arc<PdfProcessor>,
    pub scripts: ScriptStore,
    pub password_gate: PasswordGate,
    pub auth: AuthConfig,
    pub max_upload_bytes: usize,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl HttpState {
    pub fn new(config: &AppConfig, processor: Arc<PdfProcessor>) -> Result<Self> {
        let password_gate = config.auth.password_gate()?;
        if !password_gate.is_configured() {
            warn!("No password configured; every login attempt will be refused");
        }

        Ok(Self {
            processor,
            scripts: ScriptStore::new(config.scripts_dir.clone()),
            password_gate,
            auth: config.auth.clone(),
            max_upload_bytes: config.extraction.max_upload_bytes,
            logs: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SecurityError(_) => StatusCode::UNAUTHORIZED,
            AppError::Busy => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.user_message(),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UploadQuery {
    #[validate(length(max = 255))]
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UrlSubmission {
    pub url: String,
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

#[get("/")]
async fn index(data: web::Data<HttpState>) -> Result<HttpResponse> {
    let snapshot = data.processor.snapshot()?;
    Ok(html(views::index_page(&snapshot, data.max_upload_bytes)))
}

#[post("/process/upload")]
async fn process_upload(
    data: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    query.validate()?;
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let input = PdfInput::from_upload(
        &body,
        query.into_inner().filename,
        content_type,
        data.max_upload_bytes,
    )
    .inspect_err(|e| add_log(&data.logs, "WARN", "Upload", &e.to_string()))?;

    run_submission(&data, input).await
}

#[post("/process/url")]
async fn process_url(
    data: web::Data<HttpState>,
    req: web::Json<UrlSubmission>,
) -> Result<HttpResponse> {
    let input = PdfInput::from_link(&req.url)
        .inspect_err(|e| add_log(&data.logs, "WARN", "Upload", &e.to_string()))?;

    run_submission(&data, input).await
}

/// The submission runs on its own task so a disconnecting client cannot
/// abandon it halfway through.
async fn run_submission(data: &web::Data<HttpState>, input: PdfInput) -> Result<HttpResponse> {
    add_log(
        &data.logs,
        "INFO",
        "Processor",
        &format!("Processing {}", input.display_name()),
    );

    let processor = data.processor.clone();
    let outcome = actix_web::rt::spawn(async move { processor.submit(input).await })
        .await
        .map_err(|e| AppError::Internal(format!("Processing task failed: {}", e)))?;

    let snapshot = match outcome {
        Ok(snapshot) => snapshot,
        Err(err) => {
            add_log(&data.logs, "WARN", "Processor", &err.to_string());
            return Err(err);
        }
    };

    match snapshot.state {
        ProcessingState::Success => add_log(
            &data.logs,
            "INFO",
            "Processor",
            &format!(
                "Extracted {} rows",
                snapshot.table.as_ref().map(|t| t.len()).unwrap_or(0)
            ),
        ),
        _ => add_log(
            &data.logs,
            "ERROR",
            "Processor",
            snapshot.error.as_deref().unwrap_or("Extraction failed"),
        ),
    }

    Ok(HttpResponse::Ok().json(snapshot))
}

#[get("/result")]
async fn get_result(data: web::Data<HttpState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.processor.snapshot()?))
}

#[get("/export")]
async fn export_csv(data: web::Data<HttpState>) -> Result<HttpResponse> {
    let export = data.processor.export()?;
    add_log(
        &data.logs,
        "INFO",
        "Export",
        &format!("Downloading {}", export.file_name),
    );

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition::attachment(export.file_name))
        .body(export.content))
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data
        .logs
        .lock()
        .map(|logs| logs.clone())
        .unwrap_or_default();
    HttpResponse::Ok().json(logs)
}

#[get("/scripts")]
async fn scripts_index(data: web::Data<HttpState>) -> HttpResponse {
    html(views::scripts_page(&data.scripts.list()))
}

#[get("/scripts/{name}")]
async fn download_script(
    data: web::Data<HttpState>,
    name: web::Path<String>,
) -> Result<HttpResponse> {
    let (info, bytes) = data.scripts.read(&name).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/x-python; charset=utf-8")
        .insert_header(ContentDisposition::attachment(info.file_name))
        .body(bytes))
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };

    match level {
        "ERROR" => error!(source, "{}", message),
        "WARN" => warn!(source, "{}", message),
        _ => info!(source, "{}", message),
    }

    if let Ok(mut logs) = logs.lock() {
        logs.push(entry);
        if logs.len() > MAX_LOG_ENTRIES {
            logs.remove(0);
        }
    }
}

/// Raw-body and JSON limits for a given upload cap. The JSON limit covers the
/// Base64 data URI of a body at the raw limit.
fn body_limits(max_upload_bytes: usize) -> (usize, usize) {
    // Leave headroom so slightly oversized files reach the friendlier check in `PdfInput`.
    let raw = max_upload_bytes.saturating_add(1024 * 1024);
    let json = (raw / 3).saturating_mul(4).saturating_add(1024);
    (raw, json)
}

/// Routes and body limits; the session middleware is wrapped by the caller.
pub fn configure(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    let (raw_limit, json_limit) = body_limits(max_upload_bytes);
    cfg.app_data(web::PayloadConfig::new(raw_limit))
        .app_data(web::JsonConfig::default().limit(json_limit))
        .service(session::login_form)
        .service(session::login)
        .service(session::logout)
        .service(index)
        .service(scripts_index)
        .service(download_script)
        .service(
            web::scope("/api")
                .service(process_upload)
                .service(process_url)
                .service(get_result)
                .service(export_csv)
                .service(get_logs),
        );
}

pub fn start_server(config: &ServerConfig, state: HttpState) -> std::io::Result<Server> {
    let max_upload_bytes = state.max_upload_bytes;
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::from_fn(session::require_session))
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(|cfg| configure(cfg, max_upload_bytes))
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    info!(host = %config.host, port = config.port, "HTTP server listening");
    Ok(server)
}
