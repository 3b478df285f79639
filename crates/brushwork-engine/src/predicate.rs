use crate::error::{EngineError, EngineResult};
use brushwork_table::{Table, Value};
use chrono::{DateTime, Local};
use std::fmt::Write as _;

/// What a brushed selection selects.
///
/// Range bounds are strictly exclusive on both sides: a row whose value equals `low` or `high`
/// is not selected.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    /// No filtering.
    Null,
    /// `low < column < high`.
    Range1D {
        column: String,
        low: f64,
        high: f64,
    },
    /// `column ∈ allowed`.
    Categorical1D { column: String, allowed: Vec<Value> },
    /// Conjunction of two open intervals.
    Range2D {
        x_column: String,
        x_low: f64,
        x_high: f64,
        y_column: String,
        y_low: f64,
        y_high: f64,
    },
}

/// An immutable, timestamped selection over one table.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionPredicate {
    selection: Selection,
    interaction_time: DateTime<Local>,
}

impl SelectionPredicate {
    pub fn new(selection: Selection) -> Self {
        Self::at(selection, Local::now())
    }

    pub fn at(selection: Selection, interaction_time: DateTime<Local>) -> Self {
        Self {
            selection,
            interaction_time,
        }
    }

    pub fn null() -> Self {
        Self::new(Selection::Null)
    }

    pub fn range_1d(column: impl Into<String>, low: f64, high: f64) -> Self {
        Self::new(Selection::Range1D {
            column: column.into(),
            low,
            high,
        })
    }

    pub fn categorical(
        column: impl Into<String>,
        allowed: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self::new(Selection::Categorical1D {
            column: column.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        })
    }

    pub fn range_2d(
        x_column: impl Into<String>,
        (x_low, x_high): (f64, f64),
        y_column: impl Into<String>,
        (y_low, y_high): (f64, f64),
    ) -> Self {
        Self::new(Selection::Range2D {
            x_column: x_column.into(),
            x_low,
            x_high,
            y_column: y_column.into(),
            y_low,
            y_high,
        })
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn interaction_time(&self) -> DateTime<Local> {
        self.interaction_time
    }

    /// Columns the predicate reads.
    pub fn columns(&self) -> Vec<&str> {
        match &self.selection {
            Selection::Null => Vec::new(),
            Selection::Range1D { column, .. } | Selection::Categorical1D { column, .. } => {
                vec![column.as_str()]
            }
            Selection::Range2D {
                x_column, y_column, ..
            } => vec![x_column.as_str(), y_column.as_str()],
        }
    }

    /// Fails if the predicate reads a column `table` does not have.
    pub fn check_columns(&self, table_name: &str, table: &Table) -> EngineResult<()> {
        for column in self.columns() {
            if table.column_idx(column).is_none() {
                return Err(EngineError::UnknownColumn {
                    table: table_name.to_string(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Display name used when the predicate is pinned to the shelf: the first selected column
    /// followed by its first and last bound.
    pub fn shelf_label(&self, source_table: &str) -> String {
        match &self.selection {
            Selection::Null => format!("{source_table}_all"),
            Selection::Range1D { column, low, high } => format!("{column}_{low}_{high}"),
            Selection::Categorical1D { column, allowed } => match (allowed.first(), allowed.last())
            {
                (Some(first), Some(last)) => format!("{column}_{first}_{last}"),
                _ => format!("{column}_none"),
            },
            Selection::Range2D {
                x_column,
                x_low,
                x_high,
                ..
            } => format!("{x_column}_{x_low}_{x_high}"),
        }
    }
}

fn in_open_interval(value: &Value, low: f64, high: f64) -> bool {
    value.as_f64().is_some_and(|v| low < v && v < high)
}

/// Applies `predicate` to `table`.
///
/// The result is always a new table; with [`Selection::Null`] it is a full copy, so callers may
/// mutate it without touching the stored original.
pub fn evaluate(table: &Table, predicate: &SelectionPredicate) -> EngineResult<Table> {
    let filtered = match &predicate.selection {
        Selection::Null => table.clone(),
        Selection::Categorical1D { column, allowed } => {
            let idx = table.require_column(column)?;
            table.filter_rows(|row| allowed.contains(&row[idx]))
        }
        Selection::Range1D { column, low, high } => {
            let idx = table.require_column(column)?;
            table.filter_rows(|row| in_open_interval(&row[idx], *low, *high))
        }
        Selection::Range2D {
            x_column,
            x_low,
            x_high,
            y_column,
            y_low,
            y_high,
        } => {
            let x = table.require_column(x_column)?;
            let y = table.require_column(y_column)?;
            table.filter_rows(|row| {
                in_open_interval(&row[x], *x_low, *x_high)
                    && in_open_interval(&row[y], *y_low, *y_high)
            })
        }
    };
    Ok(filtered)
}

/// Renders `predicate` as pandas-style code over `table_name`.
///
/// Mirrors [`evaluate`] exactly, including the exclusive range bounds.
pub fn describe(predicate: &SelectionPredicate, table_name: &str) -> String {
    let time = predicate.interaction_time.format("%m_%d_%H_%M_%S");
    let mut code = format!("# generated from interaction on `{table_name}` at time {time}\n");
    let df = table_name;
    // Writing into a String cannot fail.
    let _ = match &predicate.selection {
        Selection::Null => write!(code, "{df}.copy()"),
        Selection::Categorical1D { column, allowed } => {
            let values = allowed
                .iter()
                .map(literal)
                .collect::<Vec<_>>()
                .join(", ");
            write!(code, "{df}.loc[{df}['{column}'].isin([{values}])]")
        }
        Selection::Range1D { column, low, high } => {
            let (low, high) = (number(*low), number(*high));
            write!(
                code,
                "{df}.loc[\n({df}['{column}'] > {low})\n& ({df}['{column}'] < {high})]"
            )
        }
        Selection::Range2D {
            x_column,
            x_low,
            x_high,
            y_column,
            y_low,
            y_high,
        } => {
            let (x_low, x_high) = (number(*x_low), number(*x_high));
            let (y_low, y_high) = (number(*y_low), number(*y_high));
            write!(
                code,
                "{df}.loc[\n({df}['{x_column}'] > {x_low})\n& ({df}['{x_column}'] < {x_high})\n& ({df}['{y_column}'] > {y_low})\n& ({df}['{y_column}'] < {y_high})\n]"
            )
        }
    };
    code
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Boolean(true) => "True".to_string(),
        Value::Boolean(false) => "False".to_string(),
        Value::Number(n) => number(*n),
        Value::DateTime(ms) => ms.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
    }
}

/// Python spelling of a float; non-finite values have no literal form.
fn number(n: f64) -> String {
    if n.is_nan() {
        "float('nan')".to_string()
    } else if n.is_infinite() {
        let sign = if n < 0.0 { "-" } else { "" };
        format!("{sign}float('inf')")
    } else {
        n.to_string()
    }
}
