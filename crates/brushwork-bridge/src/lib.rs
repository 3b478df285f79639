//! Protocol bridge between the selection engine and a remote visualization client.
//!
//! Inbound messages are JSON objects with a `command` field; outbound messages are JSON objects
//! with a `type` field. The bridge owns the [`SelectionEngine`], remembers the chart encoding it
//! handed out for each table (so raw brush payloads can be turned back into predicates) and
//! mirrors registry changes to the client as profiles, chart renders and data updates.
//!
//! [`SelectionEngine`]: brushwork_engine::SelectionEngine

#![forbid(unsafe_code)]

mod bridge;
mod chart;
pub mod codegen;
mod config;
mod encoding;
mod error;
mod host;
mod protocol;
mod selection;
pub mod session;
mod transport;

pub use crate::bridge::Bridge;
pub use crate::chart::{
    table_records, ChartSynthesizer, FilterLabel, VegaLiteSynthesizer, IS_OVERVIEW_FIELD,
};
pub use crate::config::BridgeConfig;
pub use crate::encoding::{
    infer_encoding, parse_mark, ChannelType, EncodingSpec, Mark, SelectionDimensions,
    SelectionType,
};
pub use crate::error::{BridgeError, BridgeResult};
pub use crate::host::{NotebookHost, RecordingHost};
pub use crate::protocol::{decode_inbound, InboundMessage, NotificationStyle, OutboundMessage};
pub use crate::selection::{interpret_selection, parse_raw_selection, RawSelection};
pub use crate::transport::{ChannelTransport, MemoryTransport, Transport};
