use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use centimo_import::{DocumentParser, FileFormat, ImportReport, KeywordCatalog};
use centimo_ocr::{sha256_hex, OcrBackend};

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};

/// Room the multipart envelope (boundaries, part headers, the categories
/// field) gets on top of the file cap before the body layer cuts off.
const ENVELOPE_SLACK: usize = 64 * 1024;

const ACCEPTED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/csv",
    "application/csv",
    "text/plain",
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "application/octet-stream",
];

pub struct AppState {
    pub parser: DocumentParser<Box<dyn OcrBackend>>,
    pub catalog: KeywordCatalog,
    pub config: ServerConfig,
}

pub type SharedState = Arc<AppState>;

pub fn app(state: SharedState) -> Router {
    let body_cap = state.config.max_upload_bytes + ENVELOPE_SLACK;
    Router::new()
        .route("/health", get(health))
        .route("/api/import", post(import_document))
        .layer(DefaultBodyLimit::disable())
        // The in-handler size check owns the 413 that carries the JSON
        // envelope; this layer only cuts off bodies past the cap plus
        // slack, and its 413 is a plain response.
        .layer(RequestBodyLimitLayer::new(body_cap))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Multipart upload: one `file` part, plus an optional `categories` part
/// holding a JSON array of the caller's category names. The parsed batch
/// goes back for review; nothing is persisted here.
async fn import_document(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> ApiResult<Json<serde_json::Value>> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut requested: Option<Vec<String>> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(|s| s.to_string());
                if let Some(mime) = field.content_type() {
                    if !mime_allowed(mime) {
                        return Err(ApiError::UnsupportedMediaType(mime.to_string()));
                    }
                }
                let Some(filename) = filename else {
                    return Err(ApiError::BadRequest("File part has no filename".into()));
                };
                let data = field.bytes().await?.to_vec();
                if data.len() > state.config.max_upload_bytes {
                    return Err(ApiError::PayloadTooLarge {
                        limit: state.config.max_upload_bytes,
                    });
                }
                upload = Some((filename, data));
            }
            "categories" => {
                let raw = field.text().await?;
                let names: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
                    ApiError::BadRequest(format!("categories must be a JSON array of names: {e}"))
                })?;
                requested = Some(names);
            }
            _ => {}
        }
    }

    let (filename, data) = upload.ok_or_else(|| ApiError::BadRequest("Missing file part".into()))?;

    let batch_id = Uuid::new_v4();
    let content_sha256 = sha256_hex(&data);
    info!(
        batch = %batch_id,
        file = %filename,
        bytes = data.len(),
        sha256 = %content_sha256,
        "import received"
    );

    let report = state.parser.parse(&filename, &data).map_err(|source| {
        warn!(batch = %batch_id, error = %source, "import stage failed");
        ApiError::Import {
            format: FileFormat::from_filename(&filename),
            source,
        }
    })?;

    let available = requested.unwrap_or_else(|| state.catalog.category_names());
    let transactions = state.catalog.apply(&report.transactions, &available);
    let report = ImportReport {
        transactions,
        ..report
    };

    info!(
        batch = %batch_id,
        count = report.metadata.total_transactions,
        method = %report.metadata.parsing_method,
        "import parsed"
    );

    respond(&report, batch_id, &content_sha256)
}

/// Serializes the report and stamps the request-scoped diagnostics into
/// its metadata without widening the import crate's wire types.
fn respond(
    report: &ImportReport,
    batch_id: Uuid,
    content_sha256: &str,
) -> ApiResult<Json<serde_json::Value>> {
    let mut body = serde_json::to_value(report)
        .map_err(|e| ApiError::Internal(format!("serializing report: {e}")))?;
    if let Some(metadata) = body["metadata"].as_object_mut() {
        metadata.insert("batchId".to_string(), json!(batch_id.to_string()));
        metadata.insert("contentSha256".to_string(), json!(content_sha256));
    }
    Ok(Json(body))
}

fn mime_allowed(mime: &str) -> bool {
    let essence = mime.split(';').next().unwrap_or(mime).trim();
    ACCEPTED_MIME_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(essence))
}
