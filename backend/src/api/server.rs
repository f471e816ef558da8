//! HTTP Server for the tabkit API.
//!
//! Accepts a CSV upload plus a pipeline of named steps and returns the
//! transformed table.
//!
//! # API Endpoints
//!
//! | Method | Path                              | Description                     |
//! |--------|-----------------------------------|---------------------------------|
//! | GET    | `/health`                         | Health check                    |
//! | GET    | `/transformations`                | Enabled transformation names    |
//! | POST   | `/transformations/{name}/enable`  | Enable or disable a name        |
//! | POST   | `/transform`                      | Run a pipeline over a CSV file  |
//! | GET    | `/logs`                           | SSE stream for real-time logs   |

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Path, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::{sse::Event, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::Value;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_info, log_success, log_warning, LOG_BROADCASTER};
use super::types::{
    HealthResponse, ToggleRequest, ToggleResponse, TransformResponse, TransformationsResponse,
};
use crate::config::ServerConfig;
use crate::error::{ServerError, ValidationError};
use crate::parser::parse_bytes;
use crate::transform::{Pipeline, PipelineExecutor, TransformationRegistry};
use crate::validation::{
    check_column_count, check_content_type, check_file_name, check_size, scan_content,
};

/// Room left in the request body limit for the pipeline field and multipart framing.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<TransformationRegistry>,
    pub executor: PipelineExecutor,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// State with a fresh registry holding the built-in transformations.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_registry(config, Arc::new(TransformationRegistry::new()))
    }

    pub fn with_registry(config: ServerConfig, registry: Arc<TransformationRegistry>) -> Self {
        Self {
            executor: PipelineExecutor::new(Arc::clone(&registry)),
            registry,
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let body_limit = state.config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(health))
        .route("/transformations", get(list_transformations))
        .route("/transformations/{name}/enable", post(toggle_transformation))
        .route("/transform", post(transform))
        .route("/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.socket_addr()?;
    let app = router(AppState::new(config));

    println!("🚀 Tabkit server running on http://{}", addr);
    println!("   GET  /health                          - Health check");
    println!("   GET  /transformations                 - List transformations");
    println!("   POST /transformations/{{name}}/enable   - Toggle a transformation");
    println!("   POST /transform                       - Run a pipeline over a CSV file");
    println!("   GET  /logs                            - SSE log stream");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Logs method, path, status and duration of every request.
async fn log_requests(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let mut response = next.run(request).await;

    log_info(format!(
        "[{}] {} {} -> {} ({} ms)",
        &request_id.simple().to_string()[..8],
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    ));
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

async fn list_transformations(State(state): State<AppState>) -> Json<TransformationsResponse> {
    Json(TransformationsResponse {
        available_transformations: state.registry.available_transformations(),
    })
}

/// Enable or disable a transformation. Unknown names are accepted.
async fn toggle_transformation(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<ToggleResponse>, ServerError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| ServerError::BadRequest("Request body must be a JSON object".to_string()))?;
    if !payload.is_object() {
        return Err(ServerError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    }
    let request: ToggleRequest = serde_json::from_value(payload)
        .map_err(|e| ServerError::BadRequest(format!("Invalid toggle request: {}", e)))?;

    if state.registry.enable(&name, request.enabled) {
        log_info(format!(
            "Transformation '{}' {}",
            name,
            if request.enabled { "enabled" } else { "disabled" }
        ));
    } else {
        log_warning(format!("Toggle ignored: transformation '{}' is not registered", name));
    }

    Ok(Json(ToggleResponse::new(&name, request.enabled)))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// The `file` part of a transform request
#[derive(Debug)]
struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Fields of a transform request, before validation
#[derive(Debug, Default)]
struct TransformForm {
    file: Option<UploadedFile>,
    pipeline: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<TransformForm, ServerError> {
    let mut form = TransformForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Failed to read upload: {}", e)))?;
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            Some("pipeline") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Failed to read pipeline: {}", e)))?;
                form.pipeline = Some(text);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Upload CSV and run a pipeline over it
async fn transform(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TransformResponse>, ServerError> {
    let no_file = || ServerError::BadRequest("No file provided".to_string());

    let form = match multipart {
        Ok(multipart) => read_form(multipart).await?,
        Err(_) => return Err(no_file()),
    };
    let file = form.file.ok_or_else(no_file)?;

    check_file_name(file.file_name.as_deref())?;
    check_content_type(file.content_type.as_deref())?;
    check_size(file.bytes.len(), state.config.max_upload_bytes)?;
    scan_content(&file.bytes)?;

    let pipeline_text = form.pipeline.filter(|p| !p.trim().is_empty()).ok_or_else(|| {
        ServerError::BadRequest("No pipeline configuration provided".to_string())
    })?;
    let payload: Value =
        serde_json::from_str(&pipeline_text).map_err(ValidationError::InvalidJson)?;

    log_info(format!(
        "New upload: {} ({} bytes)",
        file.file_name.as_deref().unwrap_or("unknown"),
        file.bytes.len()
    ));

    let parsed = parse_bytes(&file.bytes)?;
    check_column_count(&parsed.table, state.config.max_columns)?;
    log_info(format!(
        "Parsed CSV: {} rows x {} columns (encoding {}, delimiter {:?})",
        parsed.table.row_count(),
        parsed.table.column_count(),
        parsed.encoding,
        parsed.delimiter
    ));

    let pipeline = Pipeline::from_json(payload)?;
    let output = state.executor.process(&parsed.table, pipeline.steps())?;

    let response = TransformResponse::new(&parsed.table, &output);
    log_success(format!(
        "Pipeline of {} step(s) done: {:?} -> {:?}",
        pipeline.steps().len(),
        response.original_shape,
        response.transformed_shape
    ));

    Ok(Json(response))
}
