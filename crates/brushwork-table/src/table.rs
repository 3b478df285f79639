use crate::value::{ColumnType, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TableResult<T> = Result<T, TableError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    #[error("unknown column: {column}")]
    UnknownColumn { column: String },

    #[error("duplicate column: {column}")]
    DuplicateColumn { column: String },

    #[error("schema mismatch: expected {expected} values, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Categorical)
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Numeric)
    }

    pub fn temporal(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Temporal)
    }
}

/// A row-oriented table with an immutable column schema.
///
/// Rows can be appended, but columns cannot be changed once the table is created; a table with a
/// different shape is a different table.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<ColumnSchema>,
    column_index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<ColumnSchema>) -> TableResult<Self> {
        let mut column_index = HashMap::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            if column_index.insert(column.name.clone(), idx).is_some() {
                return Err(TableError::DuplicateColumn {
                    column: column.name.clone(),
                });
            }
        }

        Ok(Self {
            columns,
            column_index,
            rows: Vec::new(),
        })
    }

    pub fn from_rows(
        columns: Vec<ColumnSchema>,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> TableResult<Self> {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.column_idx(name).map(|idx| &self.columns[idx])
    }

    pub fn column_idx(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    pub fn require_column(&self, name: &str) -> TableResult<usize> {
        self.column_idx(name).ok_or_else(|| TableError::UnknownColumn {
            column: name.to_string(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, row: usize) -> Option<&[Value]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_idx(column)?;
        self.rows.get(row)?.get(idx)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> TableResult<()> {
        if row.len() != self.columns.len() {
            return Err(TableError::SchemaMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns a new table with the same schema holding the rows accepted by `keep`.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Value]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            column_index: self.column_index.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }

    pub fn column_values(&self, column: &str) -> TableResult<impl Iterator<Item = &Value> + '_> {
        let idx = self.require_column(column)?;
        Ok(self.rows.iter().filter_map(move |row| row.get(idx)))
    }

    /// Distinct non-null values of `column`, in ascending order.
    pub fn unique_values(&self, column: &str) -> TableResult<Vec<Value>> {
        let mut values: Vec<Value> = self
            .column_values(column)?
            .filter(|v| !v.is_null())
            .cloned()
            .collect();
        values.sort_by(Value::total_cmp);
        values.dedup_by(|a, b| a.total_cmp(b).is_eq());
        Ok(values)
    }

    /// Inner join with `other` on a column both tables share.
    ///
    /// Output columns are this table's columns followed by `other`'s columns minus the key.
    /// Null keys never match. Row order follows this table, then `other` for repeated keys.
    pub fn inner_join(&self, other: &Table, on: &str) -> TableResult<Table> {
        let left_key = self.require_column(on)?;
        let right_key = other.require_column(on)?;

        let mut columns = self.columns.clone();
        let right_columns: Vec<usize> = (0..other.columns.len())
            .filter(|idx| *idx != right_key)
            .collect();
        for idx in &right_columns {
            columns.push(other.columns[*idx].clone());
        }
        let mut joined = Table::new(columns)?;

        let mut index: HashMap<JoinKey, Vec<usize>> = HashMap::new();
        for (row_idx, row) in other.rows.iter().enumerate() {
            if let Some(key) = row.get(right_key).and_then(JoinKey::from_value) {
                index.entry(key).or_default().push(row_idx);
            }
        }

        for row in &self.rows {
            let Some(key) = row.get(left_key).and_then(JoinKey::from_value) else {
                continue;
            };
            let Some(matches) = index.get(&key) else {
                continue;
            };
            for right_idx in matches {
                let right = &other.rows[*right_idx];
                let mut out = row.clone();
                out.extend(right_columns.iter().map(|idx| right[*idx].clone()));
                joined.rows.push(out);
            }
        }

        Ok(joined)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum JoinKey {
    Boolean(bool),
    Number(u64),
    Text(String),
}

impl JoinKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Boolean(b) => Some(JoinKey::Boolean(*b)),
            Value::Number(n) if n.is_nan() => None,
            // -0.0 and 0.0 join together.
            Value::Number(n) => Some(JoinKey::Number((n + 0.0).to_bits())),
            Value::DateTime(ms) => Some(JoinKey::Number((*ms as f64).to_bits())),
            Value::Text(s) => Some(JoinKey::Text(s.clone())),
        }
    }
}
