use crate::encoding::{EncodingSpec, Mark, SelectionDimensions, SelectionType};
use brushwork_table::Table;
use serde_json::{json, Map, Value as JsonValue};

/// Field added to every chart record to tell overview rows from filtered rows.
pub const IS_OVERVIEW_FIELD: &str = "is_overview";

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v4.json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterLabel {
    /// Full table, drawn as the background layer.
    Overview,
    /// Rows that survived a selection.
    Filtered,
}

impl FilterLabel {
    fn is_overview(self) -> bool {
        matches!(self, FilterLabel::Overview)
    }
}

/// One JSON object per row, keyed by column name, plus the overview flag.
pub fn table_records(table: &Table, label: FilterLabel) -> Vec<JsonValue> {
    table
        .rows()
        .iter()
        .map(|row| {
            let mut record: Map<String, JsonValue> = table
                .column_names()
                .zip(row)
                .map(|(name, value)| (name.to_string(), json!(value)))
                .collect();
            record.insert(
                IS_OVERVIEW_FIELD.to_string(),
                JsonValue::Bool(label.is_overview()),
            );
            JsonValue::Object(record)
        })
        .collect()
}

/// Builds the chart spec sent in `chart_render`.
pub trait ChartSynthesizer {
    fn synthesize(&self, table_name: &str, encoding: &EncodingSpec, records: Vec<JsonValue>)
        -> JsonValue;
}

/// Vega-Lite v4 specs: a zoomable chart with the selection the encoding asks for.
#[derive(Clone, Copy, Debug, Default)]
pub struct VegaLiteSynthesizer;

impl ChartSynthesizer for VegaLiteSynthesizer {
    fn synthesize(
        &self,
        table_name: &str,
        encoding: &EncodingSpec,
        records: Vec<JsonValue>,
    ) -> JsonValue {
        let selection = selection_spec(encoding.selection_type, encoding.selection_dimensions);
        let x = json!({ "field": encoding.x, "type": encoding.x_type });
        let y = json!({ "field": encoding.y, "type": encoding.y_type });
        match encoding.mark {
            Mark::Bar => json!({
                "$schema": VEGA_LITE_SCHEMA,
                "description": format!("Generated visualization of {table_name}"),
                "selection": selection,
                "data": { "values": records },
                "mark": "bar",
                "encoding": {
                    "x": x,
                    "y": { "field": encoding.y, "type": encoding.y_type, "stack": null },
                    "color": color_spec(),
                    "opacity": { "value": 0.5 },
                    "stroke": { "value": "#F0B429" },
                    "strokeWidth": {
                        "condition": [{
                            "test": { "and": [{ "selection": "select" }, "length(data(\"select_store\"))"] },
                            "value": 3
                        }],
                        "value": 0
                    }
                }
            }),
            Mark::Circle => json!({
                "$schema": VEGA_LITE_SCHEMA,
                "description": table_name,
                "data": { "values": records },
                "selection": selection,
                "mark": "point",
                "encoding": {
                    "x": { "field": encoding.x, "type": encoding.x_type, "scale": { "zero": false } },
                    "y": y,
                    "color": color_spec(),
                    "opacity": { "value": 0.5 }
                }
            }),
            Mark::Line => json!({
                "$schema": VEGA_LITE_SCHEMA,
                "description": table_name,
                "data": { "values": records },
                "selection": selection,
                "mark": "line",
                "encoding": {
                    "x": x,
                    "y": y,
                    "color": color_spec(),
                    "opacity": { "value": 0.5 }
                }
            }),
        }
    }
}

/// Overview rows are drawn light, filtered rows dark.
fn color_spec() -> JsonValue {
    json!({
        "field": IS_OVERVIEW_FIELD,
        "type": "nominal",
        "scale": { "range": ["#003E6B", "#9FB3C8"], "domain": [false, true] },
        "legend": null
    })
}

fn zoom_spec() -> JsonValue {
    json!({
        "type": "interval",
        "bind": "scales",
        "translate": "[mousedown[!event.shiftKey], window:mouseup] > window:mousemove!",
        "zoom": "wheel!"
    })
}

fn brush_spec(dimensions: SelectionDimensions) -> JsonValue {
    let drag = "[mousedown[event.shiftKey], window:mouseup] > window:mousemove!";
    let mut brush = json!({
        "type": "interval",
        "resolve": "union",
        "on": drag,
        "translate": drag,
        "zoom": null
    });
    if let (SelectionDimensions::X | SelectionDimensions::Y, Some(fields)) =
        (dimensions, brush.as_object_mut())
    {
        fields.insert("encodings".to_string(), json!(dimensions.channels()));
    }
    brush
}

fn selection_spec(kind: SelectionType, dimensions: SelectionDimensions) -> JsonValue {
    if dimensions == SelectionDimensions::None {
        return json!({ "zoom": zoom_spec() });
    }
    match kind {
        SelectionType::Multiclick => json!({
            "zoom": zoom_spec(),
            "select": { "type": "multi", "encodings": dimensions.channels() }
        }),
        SelectionType::Brush => json!({
            "zoom": zoom_spec(),
            "brush": brush_spec(dimensions)
        }),
    }
}
