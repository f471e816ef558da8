//! REST API request and response types.
//!
//! Every error leaves the server as `{"error": "<message>"}` with the status
//! chosen by [`ServerError::status_code`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::logs::log_error;
use crate::error::ServerError;
use crate::models::Table;

/// Response of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Response of `GET /transformations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationsResponse {
    /// Enabled transformation names, in registration order
    pub available_transformations: Vec<String>,
}

/// Body of `POST /transformations/{name}/enable`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Response of `POST /transformations/{name}/enable`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub message: String,
}

impl ToggleResponse {
    pub fn new(name: &str, enabled: bool) -> Self {
        let state = if enabled { "enabled" } else { "disabled" };
        Self {
            success: true,
            message: format!("Transformation '{}' {}", name, state),
        }
    }
}

/// Response of `POST /transform`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformResponse {
    /// `[rows, columns]` of the uploaded table
    pub original_shape: [usize; 2],
    /// `[rows, columns]` after the pipeline ran
    pub transformed_shape: [usize; 2],
    /// Output rows as objects keyed by column, in column order
    pub data: Vec<Value>,
}

impl TransformResponse {
    pub fn new(original: &Table, transformed: &Table) -> Self {
        let (rows, cols) = original.shape();
        let (out_rows, out_cols) = transformed.shape();
        Self {
            original_shape: [rows, cols],
            transformed_shape: [out_rows, out_cols],
            data: transformed.to_records(),
        }
    }
}

/// Create an error response body
pub fn error_response(message: &str) -> Value {
    json!({ "error": message })
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::Validation(_) => StatusCode::BAD_REQUEST,
            ServerError::Csv(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::Csv(_) | ServerError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            log_error(format!("Request failed: {}", message));
        }
        (status, Json(error_response(&message))).into_response()
    }
}
