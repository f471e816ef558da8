//! Pipeline Executor
//!
//! Runs an ordered list of steps against a table. Each step sees exactly the
//! output of the previous one; the first failure aborts the whole run and no
//! partial result is returned.

use std::borrow::Cow;
use std::sync::Arc;

use super::pipeline::Step;
use super::registry::TransformationRegistry;
use crate::api::logs::{log_error, log_info_indent};
use crate::error::PipelineError;
use crate::models::Table;

/// Executes pipelines against the transformations of one registry
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    registry: Arc<TransformationRegistry>,
}

impl PipelineExecutor {
    pub fn new(registry: Arc<TransformationRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<TransformationRegistry> {
        &self.registry
    }

    /// Apply `steps` in order to `table`.
    ///
    /// The caller's table is only borrowed. An empty step list returns a copy
    /// of the input.
    ///
    /// # Example
    /// ```rust,ignore
    /// let executor = PipelineExecutor::new(Arc::new(TransformationRegistry::new()));
    /// let output = executor.process(&table, pipeline.steps())?;
    /// ```
    pub fn process(&self, table: &Table, steps: &[Step]) -> Result<Table, PipelineError> {
        let mut current = Cow::Borrowed(table);

        for (idx, step) in steps.iter().enumerate() {
            let transformation = self
                .registry
                .get_transformation(&step.step_type)
                .inspect_err(|e| log_error(format!("Step {} rejected: {}", idx + 1, e)))?;

            let next = transformation
                .apply(&current, &step.config)
                .inspect_err(|e| log_error(format!("Step {} ({}) failed: {}", idx + 1, step.step_type, e)))?;

            log_info_indent(
                format!(
                    "Step {} ({}): {} rows x {} columns",
                    idx + 1,
                    step.step_type,
                    next.row_count(),
                    next.column_count()
                ),
                1,
            );
            current = Cow::Owned(next);
        }

        Ok(current.into_owned())
    }
}
