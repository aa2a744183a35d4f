use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A single row: a mapping from column name to value plus the row's
/// immutable position in the dataset it was loaded from.
///
/// `origin` is assigned once at load time and never recomputed. It is the
/// only handle the UI layer has for tracing a result back to its source
/// row, so every engine result carries origins through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub origin: usize,
    pub fields: HashMap<String, Value>,
}

impl Row {
    /// Field value by column name. Absent columns read as `Null`.
    pub fn value(&self, column: &str) -> &Value {
        self.fields.get(column).unwrap_or(&Value::Null)
    }
}

/// An ordered sequence of rows sharing one column set.
///
/// Column order is preserved for display only; matching never depends
/// on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Designated key column, when the user has picked one.
    #[serde(default)]
    pub key_column: Option<String>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            key_column: None,
        }
    }

    /// Append a row; origin is the insertion position.
    pub fn push_row(&mut self, fields: HashMap<String, Value>) {
        let origin = self.rows.len();
        self.rows.push(Row { origin, fields });
    }

    /// Build a dataset from field maps in load order.
    pub fn from_rows(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: impl IntoIterator<Item = HashMap<String, Value>>,
    ) -> Self {
        let mut dataset = Self::new(name, columns);
        for fields in rows {
            dataset.push_row(fields);
        }
        dataset
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Value at (row index, column). `Null` when out of range or the
    /// column is absent.
    pub fn value(&self, row: usize, column: &str) -> &Value {
        self.rows
            .get(row)
            .map(|r| r.value(column))
            .unwrap_or(&Value::Null)
    }
}
