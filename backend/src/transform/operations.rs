//! Transformation contract and built-in operations.
//!
//! Every operation maps `(Table, StepConfig)` to a new [`Table`]. Configs are
//! free-form JSON objects; each operation deserializes the keys it needs and
//! reports anything absent or mistyped as [`TransformError::InvalidConfig`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::str::FromStr;

use super::pipeline::StepConfig;
use crate::error::TransformError;
use crate::models::{as_text, kind_name, Table};

/// A named table operation that can be registered in a
/// [`super::TransformationRegistry`].
///
/// Implementations must be pure: the input table is borrowed and the result
/// is a new value.
pub trait Transformation: Send + Sync {
    fn apply(&self, table: &Table, config: &StepConfig) -> Result<Table, TransformError>;
}

impl<F> Transformation for F
where
    F: Fn(&Table, &StepConfig) -> Result<Table, TransformError> + Send + Sync,
{
    fn apply(&self, table: &Table, config: &StepConfig) -> Result<Table, TransformError> {
        self(table, config)
    }
}

/// Deserialize a step config into the operation's typed config.
pub fn parse_config<T: DeserializeOwned>(
    transformation: &str,
    config: &StepConfig,
) -> Result<T, TransformError> {
    serde_json::from_value(Value::Object(config.clone()))
        .map_err(|e| TransformError::invalid_config(transformation, e.to_string()))
}

fn require_column(table: &Table, column: &str) -> Result<usize, TransformError> {
    table
        .column_index(column)
        .ok_or_else(|| TransformError::ColumnNotFound(column.to_string()))
}

// =============================================================================
// filter_rows
// =============================================================================

/// Comparison used by `filter_rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
}

impl FromStr for FilterOperator {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(FilterOperator::Eq),
            "!=" => Ok(FilterOperator::Ne),
            ">" => Ok(FilterOperator::Gt),
            "<" => Ok(FilterOperator::Lt),
            ">=" => Ok(FilterOperator::Ge),
            "<=" => Ok(FilterOperator::Le),
            "contains" => Ok(FilterOperator::Contains),
            other => Err(TransformError::UnsupportedOperator(other.to_string())),
        }
    }
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "==",
            FilterOperator::Ne => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Ge => ">=",
            FilterOperator::Le => "<=",
            FilterOperator::Contains => "contains",
        }
    }

    /// Evaluate `cell <op> value` for one row.
    ///
    /// Null cells never satisfy `contains` or an ordering operator. Ordering
    /// a non-null cell against a value of another kind is an
    /// [`TransformError::InvalidConfig`].
    pub fn matches(&self, column: &str, cell: &Value, value: &Value) -> Result<bool, TransformError> {
        match self {
            FilterOperator::Eq => Ok(values_equal(cell, value)),
            FilterOperator::Ne => Ok(!values_equal(cell, value)),
            FilterOperator::Contains => {
                let needle = as_text(value).ok_or_else(|| {
                    TransformError::invalid_config(FilterRows::NAME, "'contains' needs a non-null value")
                })?;
                Ok(as_text(cell).is_some_and(|text| text.contains(&needle)))
            }
            FilterOperator::Gt | FilterOperator::Lt | FilterOperator::Ge | FilterOperator::Le => {
                let Some(ordering) = order(*self, column, cell, value)? else {
                    return Ok(false);
                };
                Ok(match self {
                    FilterOperator::Gt => ordering == Ordering::Greater,
                    FilterOperator::Lt => ordering == Ordering::Less,
                    FilterOperator::Ge => ordering != Ordering::Less,
                    _ => ordering != Ordering::Greater,
                })
            }
        }
    }
}

/// Numbers compare by value (`30 == 30.0`); other kinds compare structurally,
/// so values of different kinds are never equal.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Ordering::Equal,
        _ => a == b,
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a.cmp(&b);
    }
    let a = x.as_f64().unwrap_or(f64::NAN);
    let b = y.as_f64().unwrap_or(f64::NAN);
    a.total_cmp(&b)
}

/// Ordering of a cell against the filter value; `None` for null cells.
fn order(
    operator: FilterOperator,
    column: &str,
    cell: &Value,
    value: &Value,
) -> Result<Option<Ordering>, TransformError> {
    match (cell, value) {
        (Value::Null, _) => Ok(None),
        (_, Value::Null) => Err(TransformError::invalid_config(
            FilterRows::NAME,
            format!("'{}' needs a non-null value", operator.as_str()),
        )),
        (Value::Number(a), Value::Number(b)) => Ok(Some(compare_numbers(a, b))),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (Value::Bool(a), Value::Bool(b)) => Ok(Some(a.cmp(b))),
        (c, v) => Err(TransformError::invalid_config(
            FilterRows::NAME,
            format!(
                "cannot compare {} values in column '{}' with a {} value using '{}'",
                kind_name(c),
                column,
                kind_name(v),
                operator.as_str()
            ),
        )),
    }
}

fn default_operator() -> String {
    "==".to_string()
}

#[derive(Debug, Deserialize)]
struct FilterRowsConfig {
    column: String,
    #[serde(default = "default_operator")]
    operator: String,
    value: Value,
}

/// Keeps rows where `row[column] <operator> value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterRows;

impl FilterRows {
    pub const NAME: &'static str = "filter_rows";
}

impl Transformation for FilterRows {
    fn apply(&self, table: &Table, config: &StepConfig) -> Result<Table, TransformError> {
        let cfg: FilterRowsConfig = parse_config(Self::NAME, config)?;
        let operator: FilterOperator = cfg.operator.parse()?;
        if matches!(cfg.value, Value::Array(_) | Value::Object(_)) {
            return Err(TransformError::invalid_config(Self::NAME, "'value' must be a scalar"));
        }
        let idx = require_column(table, &cfg.column)?;

        table.try_filter_rows(|row| operator.matches(&cfg.column, &row[idx], &cfg.value))
    }
}

// =============================================================================
// map_column
// =============================================================================

#[derive(Debug, Deserialize)]
struct MapColumnConfig {
    old_name: String,
    new_name: String,
}

/// Renames a column, keeping its position and values.
///
/// If `new_name` is already taken by another column, that column is dropped
/// and the renamed one keeps its own position.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapColumn;

impl MapColumn {
    pub const NAME: &'static str = "map_column";
}

impl Transformation for MapColumn {
    fn apply(&self, table: &Table, config: &StepConfig) -> Result<Table, TransformError> {
        let cfg: MapColumnConfig = parse_config(Self::NAME, config)?;
        let idx = require_column(table, &cfg.old_name)?;
        if cfg.old_name == cfg.new_name {
            return Ok(table.clone());
        }

        let (mut columns, mut rows) = table.clone().into_parts();
        let collision = columns.iter().position(|c| *c == cfg.new_name);
        columns[idx] = cfg.new_name;

        if let Some(drop_idx) = collision {
            columns.remove(drop_idx);
            for row in rows.iter_mut() {
                row.remove(drop_idx);
            }
        }

        Ok(Table::new(columns, rows)?)
    }
}

// =============================================================================
// uppercase_column
// =============================================================================

#[derive(Debug, Deserialize)]
struct UppercaseColumnConfig {
    column: String,
}

/// Replaces every value of a column with its uppercase text. Nulls stay null.
#[derive(Debug, Clone, Copy, Default)]
pub struct UppercaseColumn;

impl UppercaseColumn {
    pub const NAME: &'static str = "uppercase_column";
}

impl Transformation for UppercaseColumn {
    fn apply(&self, table: &Table, config: &StepConfig) -> Result<Table, TransformError> {
        let cfg: UppercaseColumnConfig = parse_config(Self::NAME, config)?;
        let idx = require_column(table, &cfg.column)?;

        Ok(table.map_column(idx, |value| match as_text(value) {
            Some(text) => Value::String(text.to_uppercase()),
            None => Value::Null,
        }))
    }
}

/// Get a description of the built-in transformations
pub fn transformations_description() -> String {
    r#"Built-in transformations:

| Name | Description | Config |
|------|-------------|--------|
| filter_rows | Keep rows matching a condition | column, operator (==, !=, >, <, >=, <=, contains; default ==), value |
| map_column | Rename a column | old_name, new_name |
| uppercase_column | Uppercase every value of a column | column |

Example pipeline:
[
  {"type": "filter_rows", "config": {"column": "age", "operator": ">", "value": 25}},
  {"type": "map_column", "config": {"old_name": "name", "new_name": "full_name"}},
  {"type": "uppercase_column", "config": {"column": "full_name"}}
]"#
    .to_string()
}
