//! Error types for the tabkit transformation service.
//!
//! One enum per layer:
//!
//! - [`TableError`] - Table construction invariants
//! - [`CsvError`] - CSV decoding and parsing errors
//! - [`TransformError`] - Errors raised by a single transformation
//! - [`RegistryError`] - Lookup failures in the transformation registry
//! - [`PipelineError`] - Failures while executing a pipeline
//! - [`ValidationError`] - Malformed uploads and pipeline payloads
//! - [`ServerError`] - HTTP boundary errors
//! - [`ConfigError`] - Invalid configuration values
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Table Errors
// =============================================================================

/// Violations of the [`crate::models::Table`] invariants.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    /// Two columns share a name.
    #[error("Duplicate column name: '{0}'")]
    DuplicateColumn(String),

    /// A row does not have one cell per column.
    #[error("Row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A cell holds an array or an object.
    #[error("Row {row}, column '{column}': only scalar values are allowed")]
    NonScalar { row: usize, column: String },
}

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Content is not UTF-8.
    #[error("CSV file must be UTF-8 encoded (detected {0})")]
    Encoding(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Empty file.
    #[error("No columns to parse from file")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// Parsed rows do not form a valid table.
    #[error("Invalid table: {0}")]
    Table(#[from] TableError),
}

impl CsvError {
    /// Whether the error comes from the uploaded content rather than from
    /// processing it. Empty files are treated as processing failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CsvError::EmptyFile | CsvError::IoError(_))
    }
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors raised by a transformation implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// Required config key absent or mistyped.
    #[error("Invalid config for '{transformation}': {message}")]
    InvalidConfig {
        transformation: String,
        message: String,
    },

    /// The step references a column the table does not have.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// `filter_rows` received an operator it does not know.
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// The produced table broke a table invariant.
    #[error("Transformation produced an invalid table: {0}")]
    Table(#[from] TableError),
}

impl TransformError {
    pub fn invalid_config(transformation: impl Into<String>, message: impl Into<String>) -> Self {
        TransformError::InvalidConfig {
            transformation: transformation.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors from the transformation registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Name was never registered.
    #[error("Transformation '{0}' not found")]
    NotFound(String),

    /// Name is registered but currently disabled.
    #[error("Transformation '{0}' is disabled")]
    Disabled(String),
}

// =============================================================================
// Pipeline Errors
// =============================================================================

/// Errors while executing a pipeline.
///
/// The executor does not translate failures; both variants display exactly
/// as the underlying error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// A step name could not be resolved.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A step failed while transforming the table.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Malformed request content (uploads and pipeline payloads).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Multipart file field present but without a name.
    #[error("No file selected")]
    NoFileSelected,

    /// Filename does not end with `.csv`.
    #[error("Only CSV files are supported")]
    NotCsv,

    /// Declared content type is not a CSV-compatible one.
    #[error("Unsupported content type: {0}")]
    UnsupportedMediaType(String),

    /// Upload exceeds the configured size limit.
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: usize, limit: usize },

    /// Upload contains script-like content.
    #[error("File contains disallowed content: {0}")]
    DisallowedContent(String),

    /// Parsed table has more columns than allowed.
    #[error("Too many columns: {count} (limit {limit})")]
    TooManyColumns { count: usize, limit: usize },

    /// Pipeline field is not JSON.
    #[error("Invalid JSON in pipeline configuration")]
    InvalidJson(#[source] serde_json::Error),

    /// Pipeline JSON has the wrong shape.
    #[error("Invalid pipeline configuration: {}", .errors.join("; "))]
    Schema { errors: Vec<String> },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP boundary errors. Rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid request shape not covered by [`ValidationError`].
    #[error("{0}")]
    BadRequest(String),

    /// Invalid upload or pipeline payload.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// CSV could not be turned into a table.
    #[error(transparent)]
    Csv(#[from] CsvError),

    /// Pipeline execution failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Invalid server configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("Invalid value '{value}' for {key}: {message}")]
    Invalid {
        key: String,
        value: String,
        message: String,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // RegistryError -> PipelineError keeps the message
        let err: PipelineError = RegistryError::NotFound("explode".into()).into();
        assert_eq!(err.to_string(), "Transformation 'explode' not found");

        // TransformError -> PipelineError -> ServerError
        let err: PipelineError = TransformError::ColumnNotFound("age".into()).into();
        let server: ServerError = err.into();
        assert_eq!(server.to_string(), "Column 'age' not found in table");
    }

    #[test]
    fn test_invalid_config_format() {
        let err = TransformError::invalid_config("filter_rows", "missing field `column`");
        let msg = err.to_string();
        assert!(msg.contains("filter_rows"));
        assert!(msg.contains("missing field `column`"));
    }

    #[test]
    fn test_csv_error_classification() {
        assert!(!CsvError::EmptyFile.is_client_error());
        assert!(CsvError::NoHeaders.is_client_error());
        assert!(CsvError::Parse { line: 3, message: "bad".into() }.is_client_error());
    }

    #[test]
    fn test_schema_errors_joined() {
        let err = ValidationError::Schema {
            errors: vec!["first".into(), "second".into()],
        };
        assert_eq!(err.to_string(), "Invalid pipeline configuration: first; second");
    }
}
