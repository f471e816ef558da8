//! File-level entry point used by the `tabkit transform` command.
//!
//! Reads a CSV file and a pipeline file from disk and runs the pipeline
//! through a [`PipelineExecutor`].

use std::fs;
use std::path::Path;

use super::executor::PipelineExecutor;
use super::pipeline::Pipeline;
use crate::api::logs::log_info;
use crate::models::Table;
use crate::parser::parse_csv_file;

/// Result of running a pipeline over a file
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Table as parsed from the CSV file
    pub original: Table,
    /// Table after the last step
    pub transformed: Table,
    /// Delimiter detected in the CSV file
    pub delimiter: char,
    /// Number of steps executed
    pub steps: usize,
}

/// Parse `csv_path`, load the pipeline at `pipeline_path` (flat or legacy
/// form) and run it.
pub fn transform_csv_file(
    executor: &PipelineExecutor,
    csv_path: &Path,
    pipeline_path: &Path,
) -> Result<RunOutput, Box<dyn std::error::Error>> {
    let pipeline_text = fs::read_to_string(pipeline_path)
        .map_err(|e| format!("Failed to read pipeline {}: {}", pipeline_path.display(), e))?;
    let pipeline = Pipeline::parse(&pipeline_text)?;

    let parsed = parse_csv_file(csv_path)?;
    log_info(format!(
        "Loaded {}: {} rows x {} columns",
        csv_path.display(),
        parsed.table.row_count(),
        parsed.table.column_count()
    ));

    let transformed = executor.process(&parsed.table, pipeline.steps())?;

    Ok(RunOutput {
        original: parsed.table,
        transformed,
        delimiter: parsed.delimiter,
        steps: pipeline.steps().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformationRegistry;
    use serde_json::json;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn executor() -> PipelineExecutor {
        PipelineExecutor::new(Arc::new(TransformationRegistry::new()))
    }

    #[test]
    fn test_transform_csv_file() {
        let csv = temp_file("name;age\nJohn;30\nJane;25\n");
        let pipeline = temp_file(
            r#"{"steps": [{"name": "filter_rows", "params": {"column": "age", "operator": "<", "value": 30}}]}"#,
        );

        let output = transform_csv_file(&executor(), csv.path(), pipeline.path()).unwrap();

        assert_eq!(output.delimiter, ';');
        assert_eq!(output.steps, 1);
        assert_eq!(output.original.shape(), (2, 2));
        assert_eq!(output.transformed.to_records(), vec![json!({"name": "Jane", "age": 25})]);
    }

    #[test]
    fn test_missing_pipeline_file() {
        let csv = temp_file("a\n1\n");
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("pipeline.json");

        let err = transform_csv_file(&executor(), csv.path(), &missing).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read pipeline"));
    }

    #[test]
    fn test_invalid_pipeline_file() {
        let csv = temp_file("a\n1\n");
        let pipeline = temp_file("not json");

        let err = transform_csv_file(&executor(), csv.path(), pipeline.path()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid JSON in pipeline configuration");
    }

    #[test]
    fn test_step_failure_propagates() {
        let csv = temp_file("a\n1\n");
        let pipeline = temp_file(r#"[{"type": "uppercase_column", "config": {"column": "b"}}]"#);

        let err = transform_csv_file(&executor(), csv.path(), pipeline.path()).unwrap_err();
        assert_eq!(err.to_string(), "Column 'b' not found in table");
    }
}
