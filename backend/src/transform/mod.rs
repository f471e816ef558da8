//! Transformation module.
//!
//! This module holds the transformation engine:
//! - Operations: the `Transformation` contract and the built-ins
//! - Registry: named, enable-gated transformations
//! - Pipeline: steps and payload decoding
//! - Executor: runs a pipeline against a table
//! - Runner: runs a pipeline file over a CSV file

pub mod executor;
pub mod operations;
pub mod pipeline;
pub mod registry;
pub mod runner;

pub use executor::PipelineExecutor;
pub use operations::{
    transformations_description, FilterOperator, FilterRows, MapColumn, Transformation,
    UppercaseColumn,
};
pub use pipeline::{Pipeline, Step, StepConfig, MAX_STEPS};
pub use registry::{TransformationEntry, TransformationRegistry};
pub use runner::{transform_csv_file, RunOutput};
