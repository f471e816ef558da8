//! Request validation for uploads and pipeline payloads.
//!
//! # Pipeline schema
//!
//! Pipelines are checked against a JSON Schema (Draft 7) embedded at compile
//! time from `schemas/pipeline.json`: 1 to 10 steps, each an object with
//! exactly a string `type` and an object `config`.
//!
//! # Upload hygiene
//!
//! Cheap checks on the uploaded file before it is parsed: filename and
//! extension, declared content type, size, and a scan for script-like
//! substrings. The scan is an input-hygiene heuristic, not a security
//! boundary.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use tabkit::validation::validate_pipeline_schema;
//!
//! let pipeline = json!([{"type": "uppercase_column", "config": {"column": "name"}}]);
//! assert!(validate_pipeline_schema(&pipeline).is_ok());
//! ```

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use serde_json::Value;

use crate::error::ValidationError;
use crate::models::Table;

static PIPELINE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/pipeline.json"))
        .expect("Invalid embedded schema")
});

static SCRIPT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(<\s*script|javascript\s*:|vbscript\s*:|<\s*iframe|\bon(?:error|load)\s*=|data\s*:\s*text/html)")
        .expect("Invalid script pattern")
});

/// Content types accepted for the uploaded file.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "text/csv",
    "application/csv",
    "text/plain",
    "application/vnd.ms-excel",
    "application/octet-stream",
];

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation otherwise
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check, true/false only.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a flat-form pipeline payload against the embedded schema.
pub fn validate_pipeline_schema(data: &Value) -> Result<(), ValidationError> {
    validate(&PIPELINE_SCHEMA, data).map_err(|errors| ValidationError::Schema { errors })
}

/// Quick check against the pipeline schema.
pub fn is_valid_pipeline(data: &Value) -> bool {
    is_valid(&PIPELINE_SCHEMA, data)
}

/// The file must have a name ending in `.csv`.
pub fn check_file_name(file_name: Option<&str>) -> Result<(), ValidationError> {
    let name = file_name.map(str::trim).unwrap_or("");
    if name.is_empty() {
        return Err(ValidationError::NoFileSelected);
    }
    if !name.to_ascii_lowercase().ends_with(".csv") {
        return Err(ValidationError::NotCsv);
    }
    Ok(())
}

/// A declared content type must be CSV-compatible. Parameters such as
/// `charset` are ignored.
pub fn check_content_type(content_type: Option<&str>) -> Result<(), ValidationError> {
    let Some(raw) = content_type else {
        return Ok(());
    };
    let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    if essence.is_empty() || ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedMediaType(raw.to_string()))
    }
}

pub fn check_size(size: usize, limit: usize) -> Result<(), ValidationError> {
    if size > limit {
        Err(ValidationError::FileTooLarge { size, limit })
    } else {
        Ok(())
    }
}

/// Reject uploads containing script-like substrings.
pub fn scan_content(bytes: &[u8]) -> Result<(), ValidationError> {
    match SCRIPT_PATTERN.find(bytes) {
        Some(m) => Err(ValidationError::DisallowedContent(
            String::from_utf8_lossy(m.as_bytes()).into_owned(),
        )),
        None => Ok(()),
    }
}

pub fn check_column_count(table: &Table, limit: usize) -> Result<(), ValidationError> {
    let count = table.column_count();
    if count > limit {
        Err(ValidationError::TooManyColumns { count, limit })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_pipeline() {
        let pipeline = json!([
            {"type": "filter_rows", "config": {"column": "age", "operator": ">", "value": 25}},
            {"type": "uppercase_column", "config": {"column": "name"}}
        ]);
        assert!(is_valid_pipeline(&pipeline));
        assert!(validate_pipeline_schema(&pipeline).is_ok());
    }

    #[test]
    fn test_invalid_pipeline_reports_errors() {
        let pipeline = json!([{"type": "", "config": {}, "extra": 1}]);
        let err = validate_pipeline_schema(&pipeline).unwrap_err();
        match err {
            ValidationError::Schema { errors } => assert!(!errors.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({"name": "test"})).is_ok());
        assert!(validate(&schema, &json!({"age": 42})).is_err());
    }

    #[test]
    fn test_file_name_checks() {
        assert!(check_file_name(Some("data.csv")).is_ok());
        assert!(check_file_name(Some("DATA.CSV")).is_ok());
        assert!(matches!(check_file_name(Some("")), Err(ValidationError::NoFileSelected)));
        assert!(matches!(check_file_name(None), Err(ValidationError::NoFileSelected)));
        assert!(matches!(check_file_name(Some("test.txt")), Err(ValidationError::NotCsv)));
    }

    #[test]
    fn test_content_type_checks() {
        assert!(check_content_type(None).is_ok());
        assert!(check_content_type(Some("text/csv; charset=utf-8")).is_ok());
        assert!(check_content_type(Some("application/octet-stream")).is_ok());
        assert!(matches!(
            check_content_type(Some("image/png")),
            Err(ValidationError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn test_size_limit() {
        assert!(check_size(10, 10).is_ok());
        assert!(matches!(
            check_size(11, 10),
            Err(ValidationError::FileTooLarge { size: 11, limit: 10 })
        ));
    }

    #[test]
    fn test_scan_content() {
        assert!(scan_content(b"name,bio\nJohn,likes <b>bold</b> text").is_ok());
        assert!(scan_content(b"name\n<SCRIPT>alert(1)</script>").is_err());
        assert!(scan_content(b"url\njavascript:void(0)").is_err());
        assert!(scan_content(b"img\n<img onerror=x>").is_err());
        assert!(scan_content(b"notes\nonline=yes").is_ok());
    }

    #[test]
    fn test_column_limit() {
        let columns: Vec<String> = (0..3).map(|i| format!("c{i}")).collect();
        let table = Table::new(columns, vec![]).unwrap();
        assert!(check_column_count(&table, 3).is_ok());
        assert!(matches!(
            check_column_count(&table, 2),
            Err(ValidationError::TooManyColumns { count: 3, limit: 2 })
        ));
    }
}
