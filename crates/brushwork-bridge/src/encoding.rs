use crate::error::{BridgeError, BridgeResult};
use brushwork_table::{ColumnType, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chart shape. Selections are interpreted per shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bar,
    Circle,
    Line,
}

impl Mark {
    pub fn as_str(self) -> &'static str {
        match self {
            Mark::Bar => "bar",
            Mark::Circle => "circle",
            Mark::Line => "line",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mark {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bar" => Ok(Mark::Bar),
            "circle" => Ok(Mark::Circle),
            "line" => Ok(Mark::Line),
            other => Err(BridgeError::UnhandledEncoding(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Ordinal,
    Quantitative,
    Temporal,
}

impl From<ColumnType> for ChannelType {
    fn from(value: ColumnType) -> Self {
        match value {
            ColumnType::Categorical => ChannelType::Ordinal,
            ColumnType::Numeric => ChannelType::Quantitative,
            ColumnType::Temporal => ChannelType::Temporal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    Multiclick,
    Brush,
}

/// Axes a selection spans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionDimensions {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "x")]
    X,
    #[serde(rename = "y")]
    Y,
    #[serde(rename = "xy")]
    XY,
}

impl SelectionDimensions {
    pub fn channels(self) -> &'static [&'static str] {
        match self {
            SelectionDimensions::None => &[],
            SelectionDimensions::X => &["x"],
            SelectionDimensions::Y => &["y"],
            SelectionDimensions::XY => &["x", "y"],
        }
    }
}

/// How a table is drawn, and therefore how raw selections on it are read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingSpec {
    pub mark: Mark,
    pub x: String,
    pub x_type: ChannelType,
    pub y: String,
    pub y_type: ChannelType,
    pub selection_type: SelectionType,
    pub selection_dimensions: SelectionDimensions,
}

impl EncodingSpec {
    pub fn new(
        mark: Mark,
        (x, x_type): (&str, ColumnType),
        (y, y_type): (&str, ColumnType),
        selection_type: SelectionType,
        selection_dimensions: SelectionDimensions,
    ) -> Self {
        Self {
            mark,
            x: x.to_string(),
            x_type: x_type.into(),
            y: y.to_string(),
            y_type: y_type.into(),
            selection_type,
            selection_dimensions,
        }
    }
}

/// Picks a chart for a two-column table.
///
/// Returns `None` for tables that have no obvious chart (wrong arity or unsupported column
/// type pairing).
pub fn infer_encoding(table: &Table) -> Option<EncodingSpec> {
    let [first, second] = table.columns() else {
        return None;
    };
    let x = (first.name.as_str(), first.column_type);
    let y = (second.name.as_str(), second.column_type);
    match (first.column_type, second.column_type) {
        (ColumnType::Categorical, ColumnType::Numeric) => Some(EncodingSpec::new(
            Mark::Bar,
            x,
            y,
            SelectionType::Multiclick,
            SelectionDimensions::X,
        )),
        (ColumnType::Numeric, ColumnType::Numeric) => Some(EncodingSpec::new(
            Mark::Circle,
            x,
            y,
            SelectionType::Brush,
            SelectionDimensions::XY,
        )),
        (ColumnType::Temporal, ColumnType::Numeric) => Some(EncodingSpec::new(
            Mark::Line,
            x,
            y,
            SelectionType::Brush,
            SelectionDimensions::X,
        )),
        _ => None,
    }
}

/// Parses a mark name, failing with [`BridgeError::UnhandledEncoding`] for unknown shapes.
pub fn parse_mark(name: &str) -> BridgeResult<Mark> {
    name.parse()
}
