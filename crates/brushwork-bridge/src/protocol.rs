use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Commands the client can send. The set is closed: anything else is an unhandled command.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "command")]
pub enum InboundMessage {
    #[serde(rename = "refresh-comm")]
    RefreshComm,
    #[serde(rename = "cell-ran")]
    CellRan { code: String },
    #[serde(rename = "get_code_clipboard")]
    GetCodeClipboard { df_name: String },
    #[serde(rename = "column-selected")]
    ColumnSelected { column: String, df_name: String },
    #[serde(rename = "add_selection")]
    AddSelection { df_name: String },
}

const INBOUND_COMMANDS: &[&str] = &[
    "refresh-comm",
    "cell-ran",
    "get_code_clipboard",
    "column-selected",
    "add_selection",
];

/// Decodes one inbound message.
///
/// Unknown commands map to [`BridgeError::UnhandledCommand`]; known commands with missing or
/// mistyped fields map to [`BridgeError::MalformedMessage`].
pub fn decode_inbound(raw: &JsonValue) -> BridgeResult<InboundMessage> {
    let command = raw
        .get("command")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| BridgeError::MalformedMessage(format!("missing command in {raw}")))?;
    if !INBOUND_COMMANDS.contains(&command) {
        return Err(BridgeError::UnhandledCommand(command.to_string()));
    }
    serde_json::from_value(raw.clone())
        .map_err(|err| BridgeError::MalformedMessage(format!("{command}: {err}")))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStyle {
    Error,
    Debug,
}

impl NotificationStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationStyle::Error => "error",
            NotificationStyle::Debug => "debug",
        }
    }
}

/// Messages sent to the client.
#[derive(Clone, Debug, PartialEq)]
pub enum OutboundMessage {
    /// Handshake: the name generated code uses to reach the engine.
    InstanceName { value: String },
    /// Column profile of a base table. `columns` is a JSON string.
    Profiler { df_name: String, columns: String },
    /// A new chart. `vega` is a JSON string.
    ChartRender { df_name: String, vega: String },
    ChartUpdateData {
        df_name: String,
        new_data: Vec<JsonValue>,
    },
    Notification {
        style: NotificationStyle,
        value: String,
    },
    NavigateToVis { value: String },
    ExecuteCurrentCell,
    /// Escape hatch: `{ "type": message_type, "value": value }`.
    Custom { message_type: String, value: String },
}

impl OutboundMessage {
    pub fn message_type(&self) -> &str {
        match self {
            OutboundMessage::InstanceName { .. } => "midas_instance_name",
            OutboundMessage::Profiler { .. } => "profiler",
            OutboundMessage::ChartRender { .. } => "chart_render",
            OutboundMessage::ChartUpdateData { .. } => "chart_update_data",
            OutboundMessage::Notification { .. } => "notification",
            OutboundMessage::NavigateToVis { .. } => "navigate_to_vis",
            OutboundMessage::ExecuteCurrentCell => "execute_current_cell",
            OutboundMessage::Custom { message_type, .. } => message_type,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        let kind = self.message_type();
        match self {
            OutboundMessage::InstanceName { value } | OutboundMessage::NavigateToVis { value } => {
                json!({ "type": kind, "value": value })
            }
            OutboundMessage::Profiler { df_name, columns } => {
                json!({ "type": kind, "dfName": df_name, "columns": columns })
            }
            OutboundMessage::ChartRender { df_name, vega } => {
                json!({ "type": kind, "dfName": df_name, "vega": vega })
            }
            OutboundMessage::ChartUpdateData { df_name, new_data } => {
                json!({ "type": kind, "dfName": df_name, "newData": new_data })
            }
            OutboundMessage::Notification { style, value } => {
                json!({ "type": kind, "style": style.as_str(), "value": value })
            }
            OutboundMessage::ExecuteCurrentCell => json!({ "type": kind }),
            OutboundMessage::Custom { value, .. } => json!({ "type": kind, "value": value }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_every_known_command() {
        let cases = [
            (json!({"command": "refresh-comm"}), InboundMessage::RefreshComm),
            (
                json!({"command": "cell-ran", "code": "a = 1"}),
                InboundMessage::CellRan {
                    code: "a = 1".into(),
                },
            ),
            (
                json!({"command": "get_code_clipboard", "df_name": "sales"}),
                InboundMessage::GetCodeClipboard {
                    df_name: "sales".into(),
                },
            ),
            (
                json!({"command": "column-selected", "column": "price", "df_name": "sales"}),
                InboundMessage::ColumnSelected {
                    column: "price".into(),
                    df_name: "sales".into(),
                },
            ),
            (
                json!({"command": "add_selection", "df_name": "sales"}),
                InboundMessage::AddSelection {
                    df_name: "sales".into(),
                },
            ),
        ];
        for (raw, expected) in cases {
            assert_eq!(decode_inbound(&raw).unwrap(), expected);
        }
    }

    #[test]
    fn unknown_and_malformed_commands_are_distinguished() {
        assert!(matches!(
            decode_inbound(&json!({"command": "unknown-xyz"})),
            Err(BridgeError::UnhandledCommand(c)) if c == "unknown-xyz"
        ));
        assert!(matches!(
            decode_inbound(&json!({"command": "cell-ran"})),
            Err(BridgeError::MalformedMessage(_))
        ));
        assert!(matches!(
            decode_inbound(&json!({"df_name": "sales"})),
            Err(BridgeError::MalformedMessage(_))
        ));
    }

    #[test]
    fn outbound_shapes() {
        assert_eq!(
            OutboundMessage::ChartUpdateData {
                df_name: "sales".into(),
                new_data: vec![json!({"a": 1})],
            }
            .to_json(),
            json!({"type": "chart_update_data", "dfName": "sales", "newData": [{"a": 1}]})
        );
        assert_eq!(
            OutboundMessage::Custom {
                message_type: "add-selection".into(),
                value: "price_1_2".into(),
            }
            .to_json(),
            json!({"type": "add-selection", "value": "price_1_2"})
        );
        assert_eq!(
            OutboundMessage::ExecuteCurrentCell.to_json(),
            json!({"type": "execute_current_cell"})
        );
    }
}
