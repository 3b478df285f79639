//! Code snippets the bridge injects into the notebook.
//!
//! Nothing here runs the generated code; the host decides what to do with it.

use crate::encoding::EncodingSpec;
use crate::error::{BridgeError, BridgeResult};
use brushwork_table::{ColumnType, Table};
use chrono::{DateTime, Local};

/// Names assigned by `name = ...` statements in `code`, in order of appearance.
///
/// Only plain identifiers count; attribute, subscript and tuple targets and comparisons are
/// skipped.
pub fn assignment_targets(code: &str) -> Vec<String> {
    code.lines().filter_map(assignment_target).map(str::to_string).collect()
}

fn assignment_target(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let end = line
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    let (name, rest) = line.split_at(end);
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) || is_keyword(name) {
        return None;
    }
    let rest = rest.trim_start().strip_prefix('=')?;
    if rest.starts_with('=') {
        return None;
    }
    Some(name)
}

fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "if" | "elif" | "while" | "for" | "return" | "assert" | "print" | "lambda" | "not"
    )
}

/// `{df}.show(...)` call that recreates the chart for `encoding`.
pub fn show_invocation(table_name: &str, encoding: &EncodingSpec) -> String {
    format!(
        "{table_name}.show(shape='{}', x='{}', y='{}')",
        encoding.mark, encoding.x, encoding.y
    )
}

/// Query that builds the value distribution of `column`.
///
/// Categorical columns and numeric columns with fewer than `max_bins` distinct values are
/// grouped directly; other numeric columns are first binned with a width snapped by
/// [`snap_to_nice_number`]. Temporal columns are not supported.
pub fn distribution_query(
    table_name: &str,
    table: &Table,
    column: &str,
    max_bins: usize,
) -> BridgeResult<String> {
    let schema = table
        .column(column)
        .ok_or_else(|| brushwork_table::TableError::UnknownColumn {
            column: column.to_string(),
        })?;
    let new_name = format!("{column}_distribution");
    let group = format!("{new_name} = {table_name}.group('{column}')");

    match schema.column_type {
        ColumnType::Categorical => Ok(group),
        ColumnType::Temporal => Err(BridgeError::UnsupportedDistribution {
            column: column.to_string(),
            column_type: ColumnType::Temporal,
        }),
        ColumnType::Numeric => {
            let distinct: Vec<f64> = table
                .unique_values(column)?
                .iter()
                .filter_map(|v| v.as_f64())
                .collect();
            let (Some(&min), Some(&max)) = (distinct.first(), distinct.last()) else {
                return Ok(group);
            };
            if distinct.len() < max_bins.max(1) {
                return Ok(group);
            }

            let bucket_count = (distinct.len() as f64 / max_bins.max(1) as f64).round().max(1.0);
            let bound = snap_to_nice_number((max - min) / bucket_count);
            // A zero width would divide by zero in the generated lambda.
            if max <= min || !bound.is_finite() || bound <= 0.0 {
                return Ok(group);
            }
            let binning = format!("lambda x: int(x/{bound}) * {bound}");
            Ok(format!(
                "{binning}\n{table_name}.append_column('{new_name}', table.apply({binning}, '{column}'))\n{group}"
            ))
        }
    }
}

/// Rounds `value` up to 1, 2 or 5 times a power of ten.
///
/// Non-positive and non-finite inputs are returned unchanged.
pub fn snap_to_nice_number(value: f64) -> f64 {
    if !(value.is_finite() && value > 0.0) {
        return value;
    }
    let magnitude = 10f64.powf(value.log10().floor());
    let fraction = value / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Prefixes generated code with a creation stamp.
pub fn annotate_cell(code: &str, created_at: DateTime<Local>) -> String {
    format!(
        "# auto-created on {}\n{code}",
        created_at.format("%Y-%m-%d %H:%M:%S%.6f")
    )
}
