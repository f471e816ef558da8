//! Domain models for the tabkit transformation pipeline.
//!
//! - [`Table`] - In-memory dataset: ordered named columns, ordered rows
//!
//! Cells are [`serde_json::Value`] scalars (string, number, boolean or null).
//! A table is never mutated in place by a transformation: every operation
//! returns a new value and leaves its input untouched.

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::TableError;

// =============================================================================
// Table
// =============================================================================

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` aligned with [`Table::columns`].
/// Every row has exactly one cell per column; missing values are
/// [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table, checking column uniqueness, row widths and that every
    /// cell is a scalar.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }

        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RowWidth {
                    row: row_idx,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            if let Some(col_idx) = row.iter().position(|v| !is_scalar(v)) {
                return Err(TableError::NonScalar {
                    row: row_idx,
                    column: columns[col_idx].clone(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// Build a table from JSON objects, one per row.
    ///
    /// Keys absent from a record become null; keys not listed in `columns`
    /// are ignored.
    pub fn from_records(columns: Vec<String>, records: &[Value]) -> Result<Self, TableError> {
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`, the shape reported by the HTTP API.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// Returns the index of a column by name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at `row` in column `column`.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All cells of a column, in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Returns a new table containing only rows for which `predicate`
    /// returns `Ok(true)`. The first `Err` aborts the scan.
    pub fn try_filter_rows<F, E>(&self, mut predicate: F) -> Result<Table, E>
    where
        F: FnMut(&[Value]) -> Result<bool, E>,
    {
        let mut rows = Vec::new();
        for row in &self.rows {
            if predicate(row)? {
                rows.push(row.clone());
            }
        }
        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Returns a new table with every cell of column `idx` replaced by `f(cell)`.
    ///
    /// Panics if `idx` is out of bounds.
    pub fn map_column<F>(&self, idx: usize, mut f: F) -> Table
    where
        F: FnMut(&Value) -> Value,
    {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                row[idx] = f(&row[idx]);
                row
            })
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Rows as JSON objects whose keys follow column order.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

// =============================================================================
// Cell helpers
// =============================================================================

/// Whether a value may be stored in a table cell.
pub fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Textual representation of a scalar; `None` for null.
///
/// Booleans render as `True` / `False`.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        other => Some(other.to_string()),
    }
}

/// Short name of a value's kind, used in error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> Table {
        Table::from_records(
            vec!["name".into(), "age".into()],
            &[json!({"name": "John", "age": 30}), json!({"name": "Jane"})],
        )
        .unwrap()
    }

    #[test]
    fn test_from_records_fills_missing_with_null() {
        let table = people();
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.value(1, "age"), Some(&Value::Null));
        assert_eq!(table.value(0, "name"), Some(&json!("John")));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let err = Table::new(vec!["a".into(), "a".into()], vec![]).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Table::new(vec!["a".into(), "b".into()], vec![vec![json!(1)]]).unwrap_err();
        assert_eq!(
            err,
            TableError::RowWidth {
                row: 0,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_non_scalar_rejected() {
        let err = Table::new(vec!["a".into()], vec![vec![json!([1, 2])]]).unwrap_err();
        assert!(matches!(err, TableError::NonScalar { row: 0, .. }));
    }

    #[test]
    fn test_to_records_keeps_column_order() {
        let table = Table::new(
            vec!["z".into(), "a".into()],
            vec![vec![json!(1), json!(2)]],
        )
        .unwrap();
        let records = table.to_records();
        let keys: Vec<&String> = records[0].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_map_column_leaves_original_untouched() {
        let table = people();
        let mapped = table.map_column(0, |_| json!("X"));
        assert_eq!(mapped.value(0, "name"), Some(&json!("X")));
        assert_eq!(table.value(0, "name"), Some(&json!("John")));
    }

    #[test]
    fn test_as_text() {
        assert_eq!(as_text(&json!("a")), Some("a".into()));
        assert_eq!(as_text(&json!(30)), Some("30".into()));
        assert_eq!(as_text(&json!(true)), Some("True".into()));
        assert_eq!(as_text(&json!(false)), Some("False".into()));
        assert_eq!(as_text(&Value::Null), None);
    }
}
