use crate::encoding::{EncodingSpec, Mark};
use crate::error::{BridgeError, BridgeResult};
use brushwork_engine::SelectionPredicate;
use brushwork_table::Value;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Selection payload as the chart reports it: channel field name → selected values (a
/// `[low, high]` pair for brushes, the clicked values for multi-click).
pub type RawSelection = BTreeMap<String, Vec<JsonValue>>;

/// Parses the payload handed over by the client.
///
/// `"null"`, `{}` and blank input mean the selection was cleared and yield `None`.
pub fn parse_raw_selection(raw: &str) -> BridgeResult<Option<RawSelection>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let parsed: Option<RawSelection> = serde_json::from_str(raw)?;
    Ok(parsed.filter(|selection| !selection.is_empty()))
}

/// Turns a raw selection into predicates, using the encoding the chart was drawn with.
///
/// A cleared selection yields no predicates.
pub fn interpret_selection(
    table: &str,
    encoding: &EncodingSpec,
    raw: Option<&RawSelection>,
) -> BridgeResult<Vec<SelectionPredicate>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let predicate = match encoding.mark {
        Mark::Circle => {
            let x = bounds(table, raw, &encoding.x)?;
            let y = bounds(table, raw, &encoding.y)?;
            SelectionPredicate::range_2d(&encoding.x, x, &encoding.y, y)
        }
        Mark::Bar => {
            let values = channel(table, raw, &encoding.x)?;
            SelectionPredicate::categorical(&encoding.x, values.iter().map(json_to_value))
        }
        Mark::Line => {
            let (low, high) = bounds(table, raw, &encoding.x)?;
            SelectionPredicate::range_1d(&encoding.x, low, high)
        }
    };
    Ok(vec![predicate])
}

fn channel<'a>(table: &str, raw: &'a RawSelection, field: &str) -> BridgeResult<&'a [JsonValue]> {
    raw.get(field)
        .map(Vec::as_slice)
        .ok_or_else(|| BridgeError::InvalidSelection {
            table: table.to_string(),
            reason: format!("no values for `{field}`"),
        })
}

/// First and last value of a brushed channel.
fn bounds(table: &str, raw: &RawSelection, field: &str) -> BridgeResult<(f64, f64)> {
    let values = channel(table, raw, field)?;
    let invalid = |reason: String| BridgeError::InvalidSelection {
        table: table.to_string(),
        reason,
    };
    let (Some(first), Some(last)) = (values.first(), values.last()) else {
        return Err(invalid(format!("empty range for `{field}`")));
    };
    let number = |v: &JsonValue| {
        v.as_f64()
            .ok_or_else(|| invalid(format!("`{field}` bound {v} is not a number")))
    };
    Ok((number(first)?, number(last)?))
}

fn json_to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
        JsonValue::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}
