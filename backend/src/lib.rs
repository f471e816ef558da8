//! # Tabkit - CSV transformation pipelines over HTTP
//!
//! Tabkit accepts a CSV dataset plus a declarative pipeline of named steps
//! and returns the dataset after applying those steps in order.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Executor   │────▶│  JSON rows  │
//! │   (UTF-8)   │     │ (types/sep) │     │ (registry)  │     │  + shapes   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tabkit::{parse_bytes, Pipeline, PipelineExecutor, TransformationRegistry};
//!
//! let registry = Arc::new(TransformationRegistry::new());
//! let executor = PipelineExecutor::new(registry);
//!
//! let parsed = parse_bytes(b"name,age\nJohn,30\nJane,25").unwrap();
//! let pipeline = Pipeline::parse(r#"[{"type": "filter_rows", "config": {"column": "age", "operator": ">", "value": 25}}]"#).unwrap();
//! let output = executor.process(&parsed.table, pipeline.steps()).unwrap();
//! assert_eq!(output.row_count(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - The in-memory [`Table`]
//! - [`parser`] - CSV parsing with delimiter detection and type inference
//! - [`transform`] - Registry, built-in transformations, pipeline and executor
//! - [`validation`] - Pipeline schema and upload checks
//! - [`config`] - Server settings from the environment
//! - [`api`] - HTTP API server and log stream

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Configuration
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, PipelineError, RegistryError, ServerError, TableError,
    TransformError, ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::Table;

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_utf8, detect_delimiter, detect_encoding, parse_bytes, parse_csv_file, parse_str,
    ParseResult,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    transform_csv_file, transformations_description, Pipeline, PipelineExecutor, RunOutput,
    Step, StepConfig, Transformation, TransformationRegistry, MAX_STEPS,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid, is_valid_pipeline, validate, validate_pipeline_schema};

// =============================================================================
// Re-exports - Configuration & API
// =============================================================================

pub use api::types::{error_response, TransformResponse};
pub use config::ServerConfig;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
